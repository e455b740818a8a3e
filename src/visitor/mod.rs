//! Visitor identity and the QR payload codec
//!
//! Badges encode `<name>.<id>`; the id is whatever follows the last dot so
//! names may contain dots themselves.

pub mod codec;

pub use codec::{parse, VisitorIdentity};
