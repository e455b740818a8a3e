//! Capture & Persistence
//!
//! Snapshots the current video frame as JPEG and writes it, together with a
//! JSON visitor record, to a [`VisitorStore`]. Every operation here converts
//! its faults into values; nothing propagates into the scan state machine.

pub mod error;
pub mod frame;
pub mod store;

pub use error::PersistenceError;
pub use frame::{capture_frame, encode_jpeg, JPEG_QUALITY};
pub use store::{
    image_filename, record_filename, LocalStore, PersistenceOutcome, VisitorRecord, VisitorStore,
};
