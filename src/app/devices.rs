//! Console devices: a synthetic camera and a keyboard-wedge line reader

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::camera::{CameraPlatform, Frame, MediaStream, MediaTrack, PlatformFault, StreamRequest};

/// Camera platform producing a moving color gradient
#[derive(Debug, Default)]
pub struct TestPatternCamera;

#[async_trait]
impl CameraPlatform for TestPatternCamera {
    async fn get_user_media(
        &self,
        request: StreamRequest,
    ) -> Result<Arc<dyn MediaStream>, PlatformFault> {
        if request.width == 0 || request.height == 0 {
            return Err(PlatformFault::Other("Requested frame size is empty".into()));
        }
        Ok(Arc::new(TestPatternStream {
            width: request.width,
            height: request.height,
            track: Arc::new(PatternTrack::default()),
            frame_index: AtomicU32::new(0),
        }))
    }
}

#[derive(Debug, Default)]
struct PatternTrack {
    stopped: AtomicBool,
}

impl MediaTrack for PatternTrack {
    fn label(&self) -> &str {
        "test pattern"
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct TestPatternStream {
    width: u32,
    height: u32,
    track: Arc<PatternTrack>,
    frame_index: AtomicU32,
}

impl MediaStream for TestPatternStream {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        vec![self.track.clone()]
    }

    fn read_frame(&self) -> Option<Frame> {
        if !self.track.is_live() {
            return None;
        }
        let shift = self.frame_index.fetch_add(1, Ordering::Relaxed);
        Some(pattern_frame(self.width, self.height, shift))
    }
}

fn pattern_frame(width: u32, height: u32, shift: u32) -> Frame {
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for y in 0..height {
        for x in 0..width {
            let column = x.wrapping_add(shift) % width;
            rgb.push((column * 255 / width) as u8);
            rgb.push((y * 255 / height) as u8);
            rgb.push((shift % 256) as u8);
        }
    }
    Frame { width, height, rgb }
}

/// Forward each stdin line to the wedge decoder feed until EOF
pub fn spawn_stdin_feed(feed: broadcast::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    // No decoder running; the line is dropped.
                    if feed.send(line).is_err() {
                        log::debug!("Scan input ignored, scanner not running");
                    }
                }
                Ok(None) => {
                    log::info!("Scanner input closed");
                    break;
                }
                Err(e) => {
                    log::error!("Failed to read scanner input: {}", e);
                    break;
                }
            }
        }
    })
}
