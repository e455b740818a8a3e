//! Console presentation of camera and scanner state

use colored::Colorize;

use crate::camera::CameraState;
use crate::core::error_handling::ContextualError;
use crate::scanner::ScannerState;

/// Text shown for a scanner state
pub fn scanner_message(state: &ScannerState) -> String {
    match state {
        ScannerState::Idle => "Scanner stopped".to_string(),
        ScannerState::Scanning => "Please hold your QR code up to the camera".to_string(),
        ScannerState::Success { visitor, .. } => format!(
            "{}, thank you for visiting. (ID: {})",
            visitor.name(),
            visitor.id()
        ),
        ScannerState::Cooldown { remaining_seconds } => {
            format!("Next scan available in {} second(s)", remaining_seconds)
        }
        ScannerState::Error { message } => message.clone(),
    }
}

/// Text shown for a camera state
pub fn camera_message(state: &CameraState) -> String {
    match state {
        CameraState::Loading => "Starting camera...".to_string(),
        CameraState::Ready(stream) => format!("Camera ready ({} track(s))", stream.tracks().len()),
        CameraState::Error(error) => format!(
            "An error occurred: {}",
            error.user_message().unwrap_or(error.message.as_str())
        ),
    }
}

/// Writes state changes to stdout, skipping repeats
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    last_line: Option<String>,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show_camera(&mut self, state: &CameraState) {
        let text = camera_message(state);
        let line = match state {
            CameraState::Error(_) => text.red().bold().to_string(),
            _ => text.dimmed().to_string(),
        };
        self.emit(line);
    }

    pub fn show_scanner(&mut self, state: &ScannerState) {
        let text = scanner_message(state);
        let line = match state {
            ScannerState::Success { .. } => format!("\n  {}\n", text.green().bold()),
            ScannerState::Cooldown { .. } => text.yellow().to_string(),
            ScannerState::Error { .. } => format!("{} {}", text.red(), "(scan again)".dimmed()),
            ScannerState::Scanning => text.cyan().to_string(),
            ScannerState::Idle => text.dimmed().to_string(),
        };
        self.emit(line);
    }

    fn emit(&mut self, line: String) {
        if self.last_line.as_deref() == Some(line.as_str()) {
            return;
        }
        println!("{}", line);
        self.last_line = Some(line);
    }
}
