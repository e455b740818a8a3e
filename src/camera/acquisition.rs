//! Stream acquisition and lifetime management

use std::sync::Arc;
use tokio::sync::watch;

use super::error::CameraError;
use super::types::{CameraConstraints, CameraPlatform, CameraState, MediaStream, StreamRequest};

/// Request a video-only stream from the platform
///
/// `None` for the platform means the host exposes no camera capability;
/// that resolves to `device_not_found` regardless of constraints.
pub async fn acquire(
    platform: Option<&dyn CameraPlatform>,
    constraints: &CameraConstraints,
) -> Result<Arc<dyn MediaStream>, CameraError> {
    let Some(platform) = platform else {
        log::warn!("No camera capability available on this platform");
        return Err(CameraError::unsupported());
    };

    let request = StreamRequest::from(constraints);
    log::debug!(
        "Requesting camera stream {}x{} @ {} fps",
        request.width,
        request.height,
        request.frame_rate
    );

    platform.get_user_media(request).await.map_err(|fault| {
        log::warn!("Camera request failed: {}", fault);
        CameraError::from(fault)
    })
}

/// Owns the camera stream and publishes its [`CameraState`]
pub struct CameraAcquisition {
    platform: Option<Arc<dyn CameraPlatform>>,
    constraints: CameraConstraints,
    state: watch::Sender<CameraState>,
}

impl CameraAcquisition {
    pub fn new(platform: Option<Arc<dyn CameraPlatform>>, constraints: CameraConstraints) -> Self {
        let (state, _) = watch::channel(CameraState::Loading);
        Self {
            platform,
            constraints,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CameraState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CameraState {
        self.state.borrow().clone()
    }

    /// (Re)acquire the stream; always passes through `Loading` first
    pub async fn start(&mut self) -> CameraState {
        self.reset_to_loading();

        let next = match acquire(self.platform.as_deref(), &self.constraints).await {
            Ok(stream) => {
                log::info!("Camera ready ({} track(s))", stream.tracks().len());
                CameraState::Ready(stream)
            }
            Err(error) => CameraState::Error(error),
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Release the stream's tracks (if any) and go back to `Loading`
    pub fn stop(&mut self) {
        if self.reset_to_loading() {
            log::info!("Camera stopped");
        }
    }

    // Returns true when a ready stream was released.
    fn reset_to_loading(&self) -> bool {
        match self.state.send_replace(CameraState::Loading) {
            CameraState::Ready(stream) => {
                release_tracks(stream.as_ref());
                true
            }
            _ => false,
        }
    }
}

impl Drop for CameraAcquisition {
    fn drop(&mut self) {
        if let CameraState::Ready(stream) = &*self.state.borrow() {
            release_tracks(stream.as_ref());
        }
    }
}

fn release_tracks(stream: &dyn MediaStream) {
    for track in stream.tracks() {
        log::debug!("Stopping track '{}'", track.label());
        track.stop();
    }
}
