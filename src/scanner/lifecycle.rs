//! Scan lifecycle task and its handle

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use super::effects::SuccessEffects;
use super::state::{
    ScannerState, COOLDOWN_SECONDS, COOLDOWN_TICK, INVALID_FORMAT_MESSAGE, SUCCESS_DISPLAY,
};
use crate::attendance::AttendanceService;
use crate::camera::VideoSource;
use crate::capture::VisitorStore;
use crate::core::time::TimeProvider;
use crate::decoder::{DecodeAttempt, DecodeStream, DecoderFactory, DecoderOptions, QrDecoder};
use crate::visitor::{self, VisitorIdentity};

const SIGNAL_BUFFER: usize = 64;

/// Collaborators the lifecycle drives
#[derive(Clone)]
pub struct ScanDependencies {
    pub decoders: Arc<dyn DecoderFactory>,
    pub store: Arc<dyn VisitorStore>,
    pub attendance: Arc<dyn AttendanceService>,
    pub clock: Arc<dyn TimeProvider>,
}

enum Request {
    Start {
        source: Arc<dyn VideoSource>,
        done: oneshot::Sender<ScannerState>,
    },
    Stop {
        done: oneshot::Sender<()>,
    },
    ClearError {
        done: oneshot::Sender<()>,
    },
}

enum Command {
    Request(Request),
    /// Ends the task, handing back the effects still in flight
    Shutdown {
        done: oneshot::Sender<Vec<JoinHandle<()>>>,
    },
}

/// Messages from decoder pumps and timers. Each carries the generation it
/// was created under; stale ones are dropped.
#[derive(Debug)]
enum Signal {
    Detected { generation: u64, attempt: DecodeAttempt },
    DecoderEnded { generation: u64 },
    EnterCooldown { generation: u64 },
    CooldownTick { generation: u64 },
}

struct ActiveDecoder {
    decoder: Box<dyn QrDecoder>,
    pump: JoinHandle<()>,
}

impl ActiveDecoder {
    fn release(mut self) {
        self.pump.abort();
        self.decoder.destroy();
    }
}

/// Owner of the decoder, the timers and the published state
pub struct ScanLifecycle {
    deps: ScanDependencies,
    state: watch::Sender<ScannerState>,
    signals: mpsc::Sender<Signal>,
    generation: u64,
    video: Option<Arc<dyn VideoSource>>,
    decoder: Option<ActiveDecoder>,
    timer: Option<JoinHandle<()>>,
    effects: Vec<JoinHandle<()>>,
}

impl ScanLifecycle {
    /// Spawn the lifecycle task and return a handle to it.
    ///
    /// The task tears everything down once every handle has been dropped.
    pub fn spawn(deps: ScanDependencies) -> ScannerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (lifecycle, signal_rx, state_rx) = ScanLifecycle::new(deps);
        tokio::spawn(lifecycle.run(command_rx, signal_rx));

        ScannerHandle {
            commands: command_tx,
            state: state_rx,
        }
    }

    fn new(
        deps: ScanDependencies,
    ) -> (Self, mpsc::Receiver<Signal>, watch::Receiver<ScannerState>) {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let (state_tx, state_rx) = watch::channel(ScannerState::Idle);

        let lifecycle = ScanLifecycle {
            deps,
            state: state_tx,
            signals: signal_tx,
            generation: 0,
            video: None,
            decoder: None,
            timer: None,
            effects: Vec::new(),
        };
        (lifecycle, signal_rx, state_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut signals: mpsc::Receiver<Signal>,
    ) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown { done }) => {
                        self.stop_scanning();
                        let _ = done.send(std::mem::take(&mut self.effects));
                        break;
                    }
                    Some(Command::Request(request)) => self.handle_request(request).await,
                    None => {
                        log::debug!("All scanner handles dropped, tearing down");
                        self.stop_scanning();
                        break;
                    }
                },
                Some(signal) = signals.recv() => self.handle_signal(signal),
            }
        }
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::Start { source, done } => {
                let state = self.start_scanning(source).await;
                let _ = done.send(state);
            }
            Request::Stop { done } => {
                self.stop_scanning();
                let _ = done.send(());
            }
            Request::ClearError { done } => {
                self.clear_error();
                let _ = done.send(());
            }
        }
    }

    async fn start_scanning(&mut self, source: Arc<dyn VideoSource>) -> ScannerState {
        self.release_decoder();
        self.cancel_timer();
        self.generation += 1;
        let generation = self.generation;

        let mut decoder = self
            .deps
            .decoders
            .bind(source.clone(), DecoderOptions::detailed());

        match decoder.start().await {
            Ok(stream) => {
                let pump = spawn_pump(stream, generation, self.signals.clone());
                self.decoder = Some(ActiveDecoder { decoder, pump });
                self.video = Some(source);
                log::info!("QR scanner started (generation {})", generation);
                self.publish(ScannerState::Scanning);
            }
            Err(e) => {
                decoder.destroy();
                self.video = None;
                log::error!("{}", e);
                self.publish(ScannerState::Error {
                    message: e.to_string(),
                });
            }
        }
        self.state.borrow().clone()
    }

    fn stop_scanning(&mut self) {
        self.release_decoder();
        self.cancel_timer();
        self.video = None;
        self.generation += 1;
        self.publish(ScannerState::Idle);
    }

    fn clear_error(&mut self) {
        if matches!(*self.state.borrow(), ScannerState::Error { .. }) {
            self.publish(ScannerState::Idle);
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::Detected { generation, attempt } if self.is_current(generation) => {
                self.on_detection(attempt)
            }
            Signal::DecoderEnded { generation } if self.is_current(generation) => {
                log::warn!("QR decoder stopped producing results");
            }
            Signal::EnterCooldown { generation } if self.is_current(generation) => {
                if matches!(*self.state.borrow(), ScannerState::Success { .. }) {
                    self.publish(ScannerState::Cooldown {
                        remaining_seconds: COOLDOWN_SECONDS,
                    });
                }
            }
            Signal::CooldownTick { generation } if self.is_current(generation) => {
                self.on_cooldown_tick()
            }
            stale => log::trace!("Dropping stale scanner signal {:?}", stale),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.decoder.is_some()
    }

    fn on_detection(&mut self, attempt: DecodeAttempt) {
        let Some(text) = attempt.text() else {
            return;
        };
        if !self.state.borrow().accepts_scans() {
            log::trace!("Ignoring decode result while {}", self.state.borrow().name());
            return;
        }

        match visitor::parse(text) {
            Some(visitor) => self.enter_success(visitor),
            None => {
                log::debug!("Rejected QR payload {:?}", text);
                self.publish(ScannerState::Error {
                    message: INVALID_FORMAT_MESSAGE.to_string(),
                });
            }
        }
    }

    fn enter_success(&mut self, visitor: VisitorIdentity) {
        let timestamp = self.deps.clock.now_utc();
        log::info!("Scanned {}", visitor);

        self.publish(ScannerState::Success {
            visitor: visitor.clone(),
            timestamp,
        });

        self.cancel_timer();
        self.timer = Some(spawn_cooldown_timer(self.generation, self.signals.clone()));

        let effects = SuccessEffects::new(
            self.video.clone(),
            self.deps.store.clone(),
            self.deps.attendance.clone(),
        );
        self.effects.retain(|task| !task.is_finished());
        self.effects
            .push(tokio::spawn(effects.run(visitor, timestamp)));
    }

    fn on_cooldown_tick(&mut self) {
        let remaining = match *self.state.borrow() {
            ScannerState::Cooldown { remaining_seconds } => remaining_seconds,
            _ => return,
        };
        match remaining.saturating_sub(1) {
            0 => {
                self.timer = None;
                self.publish(ScannerState::Scanning);
            }
            remaining_seconds => self.publish(ScannerState::Cooldown { remaining_seconds }),
        }
    }

    fn publish(&self, next: ScannerState) {
        let previous = self.state.send_replace(next);
        let current = self.state.borrow();
        if previous.name() != current.name() {
            log::debug!("Scanner {} -> {}", previous.name(), current.name());
        }
    }

    fn release_decoder(&mut self) {
        if let Some(active) = self.decoder.take() {
            active.release();
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for ScanLifecycle {
    fn drop(&mut self) {
        self.release_decoder();
        self.cancel_timer();
    }
}

fn spawn_pump(
    mut stream: DecodeStream,
    generation: u64,
    signals: mpsc::Sender<Signal>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(attempt) = stream.next().await {
            if signals
                .send(Signal::Detected { generation, attempt })
                .await
                .is_err()
            {
                return;
            }
        }
        let _ = signals.send(Signal::DecoderEnded { generation }).await;
    })
}

fn spawn_cooldown_timer(generation: u64, signals: mpsc::Sender<Signal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(SUCCESS_DISPLAY).await;
        if signals
            .send(Signal::EnterCooldown { generation })
            .await
            .is_err()
        {
            return;
        }

        let mut ticks = interval_at(Instant::now() + COOLDOWN_TICK, COOLDOWN_TICK);
        for _ in 0..COOLDOWN_SECONDS {
            ticks.tick().await;
            if signals
                .send(Signal::CooldownTick { generation })
                .await
                .is_err()
            {
                return;
            }
        }
    })
}

/// Cloneable handle to a running [`ScanLifecycle`]
#[derive(Clone)]
pub struct ScannerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ScannerState>,
}

impl ScannerHandle {
    /// Bind a fresh decoder to `source` and begin scanning. Any decoder
    /// from an earlier start is destroyed first.
    ///
    /// Returns the state right after the start attempt: `Scanning`, or
    /// `Error` when the decoder failed to start.
    pub async fn start_scanning(&self, source: Arc<dyn VideoSource>) -> ScannerState {
        let (done, reply) = oneshot::channel();
        let request = Request::Start { source, done };
        if self.commands.send(Command::Request(request)).is_err() {
            log::warn!("Scanner task is gone, cannot start scanning");
            return self.state();
        }
        reply.await.unwrap_or_else(|_| self.state())
    }

    /// Destroy the decoder, cancel pending timers and return to idle
    pub async fn stop_scanning(&self) {
        let (done, reply) = oneshot::channel();
        if self.commands.send(Command::Request(Request::Stop { done })).is_ok() {
            let _ = reply.await;
        }
    }

    /// Leave the error state. No effect in any other state.
    pub async fn clear_error(&self) {
        let (done, reply) = oneshot::channel();
        if self
            .commands
            .send(Command::Request(Request::ClearError { done }))
            .is_ok()
        {
            let _ = reply.await;
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScannerState> {
        self.state.clone()
    }

    /// Tear the lifecycle down and wait for in-flight success effects
    pub async fn shutdown(self) {
        let (done, reply) = oneshot::channel();
        if self.commands.send(Command::Shutdown { done }).is_err() {
            return;
        }
        if let Ok(pending) = reply.await {
            if !pending.is_empty() {
                log::info!("Waiting for {} pending visitor save(s)", pending.len());
            }
            for result in futures::future::join_all(pending).await {
                if let Err(e) = result {
                    log::error!("Visitor save task failed: {}", e);
                }
            }
        }
    }
}
