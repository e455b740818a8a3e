//! QR Decoder capability
//!
//! A decoder is bound to a video source and, once started, yields an
//! endless stream of decode attempts. Symbology decoding itself lives
//! behind [`QrDecoder`]; the scan lifecycle only consumes attempts.

pub mod types;
pub mod wedge;

pub use types::{
    DecodeAttempt, DecodeStream, DecoderError, DecoderFactory, DecoderOptions, QrDecoder,
    ScanRegion,
};
pub use wedge::WedgeDecoderFactory;
