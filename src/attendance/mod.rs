//! Remote Attendance Update
//!
//! Marks a scanned visitor as attended in a Notion database. The lookup
//! matches the visitor's id OR name and updates the first result only; when
//! an id match and a different name match both exist, whichever the API
//! returns first wins.

pub mod error;
pub mod notion;
pub mod updater;

pub use error::AttendanceError;
pub use notion::NotionClient;
pub use updater::{AttendanceConfig, AttendanceService, AttendanceStore, AttendanceUpdater};
