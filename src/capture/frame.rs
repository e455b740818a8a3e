//! Still-frame capture

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

use super::error::PersistenceError;
use crate::camera::{Frame, VideoSource};

/// Lossy quality used for visitor snapshots
pub const JPEG_QUALITY: u8 = 80;

/// Encode the current frame of `video` as JPEG
///
/// Returns `None` when no frame is available or encoding fails; the cause is
/// logged.
pub async fn capture_frame(video: &dyn VideoSource) -> Option<Vec<u8>> {
    let Some(frame) = video.current_frame() else {
        log::debug!("No video frame available for capture");
        return None;
    };

    let encoded = tokio::task::spawn_blocking(move || encode_jpeg(&frame, JPEG_QUALITY)).await;

    match encoded {
        Ok(Ok(bytes)) => Some(bytes),
        Ok(Err(e)) => {
            log::error!("Snapshot capture failed: {}", e);
            None
        }
        Err(join_error) => {
            log::error!("Snapshot encoder task failed: {}", join_error);
            None
        }
    }
}

/// Encode an RGB frame at its native resolution
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, PersistenceError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PersistenceError::Encode {
            message: format!("frame has no pixels ({}x{})", frame.width, frame.height),
        });
    }

    let image = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone()).ok_or_else(|| {
        PersistenceError::Encode {
            message: format!(
                "buffer of {} bytes does not match {}x{} RGB",
                frame.rgb.len(),
                frame.width,
                frame.height
            ),
        }
    })?;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&image)
        .map_err(|e| PersistenceError::Encode {
            message: e.to_string(),
        })?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StillSource(Option<Frame>);

    impl VideoSource for StillSource {
        fn native_size(&self) -> Option<(u32, u32)> {
            self.0.as_ref().map(|f| (f.width, f.height))
        }

        fn current_frame(&self) -> Option<Frame> {
            self.0.clone()
        }
    }

    fn gradient(width: u32, height: u32) -> Frame {
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                rgb.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 96]);
            }
        }
        Frame { width, height, rgb }
    }

    #[tokio::test]
    async fn test_capture_produces_jpeg_at_native_size() {
        let source = StillSource(Some(gradient(64, 48)));

        let bytes = capture_frame(&source).await.expect("snapshot");

        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG start-of-image marker");
        let decoded = image::load_from_memory(&bytes).expect("decodable");
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[tokio::test]
    async fn test_capture_without_frame_is_none() {
        assert!(capture_frame(&StillSource(None)).await.is_none());
    }

    #[tokio::test]
    async fn test_capture_with_corrupt_frame_is_none() {
        let frame = Frame {
            width: 10,
            height: 10,
            rgb: vec![0; 7],
        };
        assert!(capture_frame(&StillSource(Some(frame))).await.is_none());
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let frame = Frame {
            width: 0,
            height: 0,
            rgb: Vec::new(),
        };
        let err = encode_jpeg(&frame, JPEG_QUALITY).unwrap_err();
        assert!(err.to_string().contains("no pixels"));
    }
}
