//! Video element that the decoder and frame capture read from

use std::sync::{Arc, RwLock};

use super::types::{Frame, MediaStream};

/// A readable video surface
pub trait VideoSource: Send + Sync {
    /// Native resolution of the current frame, `None` when nothing is playing
    fn native_size(&self) -> Option<(u32, u32)>;

    /// Snapshot of the current frame
    fn current_frame(&self) -> Option<Frame>;
}

/// Presentation-side video element bound to a live stream
///
/// Attaching a stream does not take ownership of its tracks; stopping
/// them stays with [`super::CameraAcquisition`].
#[derive(Debug, Default)]
pub struct VideoElement {
    source: RwLock<Option<Arc<dyn MediaStream>>>,
}

impl VideoElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, stream: Arc<dyn MediaStream>) {
        if let Ok(mut source) = self.source.write() {
            *source = Some(stream);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut source) = self.source.write() {
            *source = None;
        }
    }

    /// True once a live stream is attached and has produced a frame
    pub fn is_playable(&self) -> bool {
        self.native_size().is_some()
    }

    fn stream(&self) -> Option<Arc<dyn MediaStream>> {
        self.source.read().ok().and_then(|source| source.clone())
    }
}

impl VideoSource for VideoElement {
    fn native_size(&self) -> Option<(u32, u32)> {
        let frame = self.current_frame()?;
        Some((frame.width, frame.height))
    }

    fn current_frame(&self) -> Option<Frame> {
        let stream = self.stream()?;
        if !stream.tracks().iter().any(|track| track.is_live()) {
            return None;
        }
        stream.read_frame()
    }
}
