//! Camera data types and the platform seam

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::error::{CameraError, PlatformFault};

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Requested capture constraints; unset (or zero) values use the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraConstraints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<u32>,
}

/// Fully resolved request handed to the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub audio: bool,
}

impl From<&CameraConstraints> for StreamRequest {
    fn from(constraints: &CameraConstraints) -> Self {
        fn or_default(value: Option<u32>, default: u32) -> u32 {
            value.filter(|v| *v > 0).unwrap_or(default)
        }

        Self {
            width: or_default(constraints.width, DEFAULT_WIDTH),
            height: or_default(constraints.height, DEFAULT_HEIGHT),
            frame_rate: or_default(constraints.frame_rate, DEFAULT_FRAME_RATE),
            audio: false,
        }
    }
}

/// A single decoded video frame, packed RGB8
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgb.len())
            .finish()
    }
}

/// One track of a live stream
pub trait MediaTrack: Send + Sync + fmt::Debug {
    fn label(&self) -> &str;

    /// Release the underlying device; further frames are not produced
    fn stop(&self);

    fn is_live(&self) -> bool;
}

/// A live stream as returned by the platform
pub trait MediaStream: Send + Sync + fmt::Debug {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Most recent frame, or `None` when no frame is available yet or the
    /// stream has ended
    fn read_frame(&self) -> Option<Frame>;
}

/// Host capability that can open a camera stream
#[async_trait]
pub trait CameraPlatform: Send + Sync {
    async fn get_user_media(
        &self,
        request: StreamRequest,
    ) -> Result<Arc<dyn MediaStream>, PlatformFault>;
}

/// Camera state consumed by presentation
#[derive(Debug, Clone)]
pub enum CameraState {
    Loading,
    Ready(Arc<dyn MediaStream>),
    Error(CameraError),
}

impl CameraState {
    pub fn is_loading(&self) -> bool {
        matches!(self, CameraState::Loading)
    }

    pub fn stream(&self) -> Option<&Arc<dyn MediaStream>> {
        match self {
            CameraState::Ready(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CameraError> {
        match self {
            CameraState::Error(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = StreamRequest::from(&CameraConstraints::default());
        assert_eq!(
            request,
            StreamRequest {
                width: 640,
                height: 480,
                frame_rate: 30,
                audio: false,
            }
        );
    }

    #[test]
    fn test_request_keeps_explicit_values() {
        let constraints = CameraConstraints {
            width: Some(1280),
            height: Some(720),
            frame_rate: None,
        };
        let request = StreamRequest::from(&constraints);
        assert_eq!((request.width, request.height, request.frame_rate), (1280, 720, 30));
    }

    #[test]
    fn test_zero_values_fall_back_to_defaults() {
        let constraints = CameraConstraints {
            width: Some(0),
            height: Some(0),
            frame_rate: Some(0),
        };
        let request = StreamRequest::from(&constraints);
        assert_eq!((request.width, request.height, request.frame_rate), (640, 480, 30));
    }

    #[test]
    fn test_frame_debug_hides_pixels() {
        let frame = Frame {
            width: 2,
            height: 1,
            rgb: vec![0; 6],
        };
        assert_eq!(format!("{:?}", frame), "Frame { width: 2, height: 1, bytes: 6 }");
    }
}
