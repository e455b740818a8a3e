//! Logging setup on top of flexi_logger
//!
//! Formats: `text` (default), `ext` (with source location) and `json`.
//! The handle is kept globally so the level can be changed at runtime; on
//! unix, SIGUSR1 toggles extra detail on and off.

use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<flexi_logger::LoggerHandle>> =
    std::sync::OnceLock::new();

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// Timestamp, level and message
    #[default]
    Text,
    /// Text plus the source location
    Ext,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Accepted `--log-format` values
    pub fn names() -> impl Iterator<Item = &'static str> {
        LogFormat::iter().map(LogFormat::name)
    }
}

/// Initialise the global logger
pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    let level_str = log_level.unwrap_or("info");
    let format_type = match log_format {
        Some(name) => name.parse::<LogFormat>()?,
        None => LogFormat::default(),
    };

    let mut logger = Logger::try_with_str(level_str)?;

    logger = match (format_type, color_enabled) {
        (LogFormat::Json, _) => logger.format(json_format),
        (LogFormat::Ext, true) => logger.format(extended_color_format),
        (LogFormat::Ext, false) => logger.format(extended_format),
        (LogFormat::Text, true) => logger.format(simple_color_format),
        (LogFormat::Text, false) => logger.format(simple_format),
    };

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(std::sync::Mutex::new(handle));

    Ok(())
}

/// Change the active log level at runtime
///
/// Only the level can change once the logger is running; format, colour and
/// file output are fixed by flexi_logger at initialisation.
pub fn set_log_level(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(log_level)?;
    Ok(())
}

/// Return to the level in force before the last [`set_log_level`]
pub fn reset_log_level() -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.pop_temp_spec();
    Ok(())
}

/// Level used while extra detail is switched on
pub fn detail_level(configured: Option<&str>) -> &'static str {
    match configured {
        Some("debug") | Some("trace") => "trace",
        _ => "debug",
    }
}

/// Toggle between the configured level and [`detail_level`] on each SIGUSR1
#[cfg(unix)]
pub fn spawn_level_toggle(
    configured: Option<&str>,
) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut requests = signal(SignalKind::user_defined1())?;
    let detail = detail_level(configured);

    Ok(tokio::spawn(async move {
        let mut verbose = false;
        while requests.recv().await.is_some() {
            let result = if verbose {
                reset_log_level()
            } else {
                set_log_level(detail)
            };
            match result {
                Ok(()) => {
                    verbose = !verbose;
                    log::info!(
                        "Detailed logging {}",
                        if verbose { "enabled" } else { "disabled" }
                    );
                }
                Err(e) => log::warn!("Could not change log level: {}", e),
            }
        }
    }))
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

// "YYYY-MM-DD HH:mm:ss.fff INF message"
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let level_colored = match record.level() {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    };

    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored,
        record.args()
    )
}

// "YYYY-MM-DD HH:mm:ss.fff INF message (scanner/lifecycle.rs:42)"
fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let level_colored = match record.level() {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    };

    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored,
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::{json, to_string};

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line())
    });

    match to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

// visitor_kiosk::scanner::lifecycle -> scanner/lifecycle.rs:LINE
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("visitor_kiosk::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    if let Some(line_num) = line {
        format!("{}:{}", path_like, line_num)
    } else {
        path_like
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flexi_logger::DeferredNow;

    fn render(
        formatter: fn(
            &mut dyn std::io::Write,
            &mut DeferredNow,
            &log::Record,
        ) -> Result<(), std::io::Error>,
        level: log::Level,
        target: &str,
    ) -> String {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();
        let record = log::Record::builder()
            .level(level)
            .target(target)
            .line(Some(42))
            .args(format_args!("Visitor scanned"))
            .build();

        formatter(&mut buffer, &mut now, &record).expect("format should succeed");
        String::from_utf8(buffer).expect("Output should be valid UTF-8")
    }

    #[test]
    fn test_simple_format_has_level_and_message() {
        let output = render(simple_format, log::Level::Info, "visitor_kiosk::scanner");
        assert!(
            output.contains("INF Visitor scanned"),
            "unexpected output: {}",
            output
        );
        assert!(!output.contains("scanner.rs"));
    }

    #[test]
    fn test_extended_format_includes_source_path() {
        let output = render(
            extended_format,
            log::Level::Warn,
            "visitor_kiosk::scanner::lifecycle",
        );
        assert!(output.contains("WRN Visitor scanned"));
        assert!(output.ends_with("(scanner/lifecycle.rs:42)"));
    }

    #[test]
    fn test_json_format_is_valid_json() {
        let output = render(json_format, log::Level::Error, "visitor_kiosk::capture");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
        assert_eq!(value["level"], "ERR");
        assert_eq!(value["message"], "Visitor scanned");
        assert_eq!(value["target"], "capture.rs:42");
    }

    #[test]
    fn test_format_target_for_external_crate() {
        assert_eq!(format_target_as_path("reqwest::connect", None), "reqwest/connect");
        assert_eq!(
            format_target_as_path("visitor_kiosk::app::startup", Some(7)),
            "app/startup.rs:7"
        );
    }

    #[test]
    fn test_set_level_without_logger_reports_error() {
        if LOGGER_HANDLE.get().is_none() {
            assert!(set_log_level("debug").is_err());
            assert!(reset_log_level().is_err());
        }
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::names().collect::<Vec<_>>(), vec!["text", "ext", "json"]);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_rejects_unknown_format() {
        assert!(init_logging(None, Some("xml"), None, false).is_err());
    }

    #[test]
    fn test_detail_level_goes_one_step_further() {
        assert_eq!(detail_level(None), "debug");
        assert_eq!(detail_level(Some("warn")), "debug");
        assert_eq!(detail_level(Some("debug")), "trace");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_level_toggle_survives_sigusr1() {
        let toggle = spawn_level_toggle(Some("info")).expect("handler installs");
        // SIGUSR1 would terminate the process without the handler
        assert_eq!(unsafe { libc::raise(libc::SIGUSR1) }, 0);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!toggle.is_finished());
        toggle.abort();
    }
}
