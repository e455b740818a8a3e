//! Kiosk startup and main loop

use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::cli::{Args, CameraMode, KioskConfig};
use super::devices::{spawn_stdin_feed, TestPatternCamera};
use super::presenter::ConsolePresenter;
use crate::attendance::AttendanceUpdater;
use crate::camera::{CameraAcquisition, CameraPlatform, CameraState, VideoElement};
use crate::capture::{LocalStore, PersistenceError};
use crate::core::error_handling::{log_error_with_context, warn_with_context};
use crate::core::logging::init_logging;
#[cfg(unix)]
use crate::core::logging::spawn_level_toggle;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::time::SystemTimeProvider;
use crate::core::version;
use crate::decoder::WedgeDecoderFactory;
use crate::scanner::{ScanDependencies, ScanLifecycle};

const SCAN_INPUT_BUFFER: usize = 16;

/// Parse configuration, initialise logging and run the kiosk until shutdown.
///
/// Returns the process exit code.
pub async fn startup() -> i32 {
    let mut args = Args::parse();

    if let Err(e) = args.load_config_file().await {
        eprintln!("Error: {}", e);
        return 1;
    }
    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let use_color = config
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    colored::control::set_override(use_color);

    let log_file = config.log_file.as_deref().and_then(|path| path.to_str());
    if let Err(e) = init_logging(
        config.log_level.as_deref(),
        config.log_format.as_deref(),
        log_file,
        use_color,
    ) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return 1;
    }

    log::info!("{} starting", version::banner());
    log::debug!("Resolved configuration: {:?}", redacted(&config));

    #[cfg(unix)]
    let level_toggle = match spawn_level_toggle(config.log_level.as_deref()) {
        Ok(task) => Some(task),
        Err(e) => {
            log::warn!("SIGUSR1 log level toggle unavailable: {}", e);
            None
        }
    };

    let result = ShutdownCoordinator::guard_with_coordinator(|coordinator, shutdown_rx| {
        run_kiosk(config, coordinator, shutdown_rx)
    })
    .await;

    #[cfg(unix)]
    {
        if let Some(task) = level_toggle {
            task.abort();
        }
    }

    match result {
        Ok(()) => 0,
        Err(e) => {
            log_error_with_context(&e, "Kiosk startup");
            1
        }
    }
}

async fn run_kiosk(
    config: KioskConfig,
    coordinator: ShutdownCoordinator,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), PersistenceError> {
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| PersistenceError::StoreUnavailable {
            path: config.output_dir.clone(),
            source,
        })?;
    log::info!("Saving visitor files to {}", config.output_dir.display());

    let attendance = AttendanceUpdater::from_config(&config.attendance);
    if let Some(problem) = attendance.configuration_error() {
        warn_with_context(&problem, "Attendance setup");
        log::warn!("Attendance updates will fail until the attendance database is configured");
    }

    let decoders = WedgeDecoderFactory::new(SCAN_INPUT_BUFFER);
    let feed = decoders.feed();
    let scanner = ScanLifecycle::spawn(ScanDependencies {
        decoders: Arc::new(decoders),
        store: Arc::new(LocalStore::new(&config.output_dir)),
        attendance: Arc::new(attendance),
        clock: Arc::new(SystemTimeProvider),
    });

    let platform: Option<Arc<dyn CameraPlatform>> = match config.camera {
        CameraMode::TestPattern => Some(Arc::new(TestPatternCamera)),
        CameraMode::None => None,
    };
    let mut camera = CameraAcquisition::new(platform, config.constraints);
    let mut presenter = ConsolePresenter::new();
    let video = Arc::new(VideoElement::new());

    presenter.show_camera(&camera.state());
    let camera_state = camera.start().await;
    presenter.show_camera(&camera_state);

    match &camera_state {
        CameraState::Ready(stream) => {
            video.attach(stream.clone());
            scanner.start_scanning(video.clone()).await;
        }
        CameraState::Error(error) => log_error_with_context(error, "Camera acquisition"),
        CameraState::Loading => {}
    }

    let mut input = spawn_stdin_feed(feed);
    let mut states = scanner.subscribe();
    presenter.show_scanner(&states.borrow_and_update().clone());

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                log::info!("Shutdown requested");
                break;
            }
            _ = &mut input => {
                log::info!("No more scanner input, shutting down");
                coordinator.trigger_shutdown();
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                presenter.show_scanner(&state);
            }
        }
    }

    input.abort();
    scanner.shutdown().await;
    video.detach();
    camera.stop();
    log::info!(
        "Kiosk stopped{}",
        if coordinator.is_shutdown_requested() { "" } else { " unexpectedly" }
    );
    Ok(())
}

fn redacted(config: &KioskConfig) -> KioskConfig {
    let mut shown = config.clone();
    if shown.attendance.api_token.is_some() {
        shown.attendance.api_token = Some("***".to_string());
    }
    shown
}
