//! Camera Acquisition
//!
//! Requests a live, video-only stream from the host platform and exposes
//! the result as a [`CameraState`]. The acquisition owns the stream: it is
//! the only component allowed to stop its tracks.

pub mod acquisition;
pub mod error;
pub mod types;
pub mod video;

pub use acquisition::{acquire, CameraAcquisition};
pub use error::{CameraError, CameraErrorKind, PlatformFault};
pub use types::{
    CameraConstraints, CameraPlatform, CameraState, Frame, MediaStream, MediaTrack, StreamRequest,
};
pub use video::{VideoElement, VideoSource};
