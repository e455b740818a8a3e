//! Generic error handling utilities
//!
//! Lets the startup path log any module's error with the right amount of
//! detail: configuration mistakes are shown verbatim, system faults get a
//! generic context line with the detail kept at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the operator can act on
    /// (bad configuration, missing credentials, denied camera permission)
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// # Examples
/// ```rust,no_run
/// # use visitor_kiosk::core::error_handling::log_error_with_context;
/// # use visitor_kiosk::attendance::AttendanceError;
/// let err = AttendanceError::NotConfigured {
///     setting: "NOTION_DATABASE_ID",
/// };
/// log_error_with_context(&err, "Attendance update");
/// // Logs: "FATAL: NOTION_DATABASE_ID is not set"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Log a failure the kiosk carries on from
///
/// Used for best-effort work (saving files, attendance updates) where the
/// failure is reported and the caller moves on.
pub fn warn_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::warn!("{}", recoverable_message(error, operation_context));
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// `"<context>: <reason>"`, preferring the user message over the raw error
pub fn recoverable_message<E: ContextualError + std::fmt::Display>(
    error: &E,
    operation_context: &str,
) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => format!("{}: {}", operation_context, user_msg),
        _ => format!("{}: {}", operation_context, error),
    }
}
