//! Scan Lifecycle
//!
//! The kiosk's core state machine. It owns the QR decoder bound to a live
//! video element and moves through
//! `idle → scanning → success → cooldown → scanning`, routing decoded text
//! through the visitor codec and kicking off capture, persistence and the
//! remote attendance update on every successful read.
//!
//! All transitions happen inside one task. Decoder callbacks and timers are
//! delivered to it as messages tagged with a generation number, so anything
//! that arrives after a stop or a restart is dropped no matter how late the
//! previous decoder shuts down.

pub mod effects;
pub mod lifecycle;
pub mod state;

pub use effects::SuccessEffects;
pub use lifecycle::{ScanDependencies, ScanLifecycle, ScannerHandle};
pub use state::{
    ScannerState, COOLDOWN_SECONDS, COOLDOWN_TICK, INVALID_FORMAT_MESSAGE, SUCCESS_DISPLAY,
};
