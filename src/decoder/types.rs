//! Decoder seam types

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::camera::VideoSource;

/// Bounding box of a detected code, in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of one pass over a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeAttempt {
    Empty,
    Found {
        text: String,
        region: Option<ScanRegion>,
    },
}

impl DecodeAttempt {
    pub fn found(text: impl Into<String>) -> Self {
        DecodeAttempt::Found {
            text: text.into(),
            region: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            DecodeAttempt::Found { text, .. } => Some(text),
            DecodeAttempt::Empty => None,
        }
    }
}

/// Decoder behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderOptions {
    /// Report text together with the region it was found in
    pub detailed_results: bool,
    pub highlight_scan_region: bool,
    pub highlight_code_outline: bool,
}

impl DecoderOptions {
    /// Options used by the scan lifecycle
    pub fn detailed() -> Self {
        Self {
            detailed_results: true,
            highlight_scan_region: true,
            highlight_code_outline: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to start the QR scanner: {0}")]
    StartFailed(String),

    #[error("QR scanner has already been destroyed")]
    Destroyed,
}

/// Lazy, endless sequence of decode attempts
pub type DecodeStream = BoxStream<'static, DecodeAttempt>;

/// One decoder instance bound to a video source
#[async_trait]
pub trait QrDecoder: Send {
    /// Start scanning; the returned stream ends only when the decoder is
    /// destroyed or its input goes away
    async fn start(&mut self) -> Result<DecodeStream, DecoderError>;

    /// Release decoder resources. Idempotent.
    fn destroy(&mut self);
}

/// Creates decoders bound to a video source
pub trait DecoderFactory: Send + Sync {
    fn bind(&self, source: Arc<dyn VideoSource>, options: DecoderOptions) -> Box<dyn QrDecoder>;
}
