//! Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

use visitor_kiosk::attendance::{AttendanceError, AttendanceService};
use visitor_kiosk::camera::{Frame, VideoSource};
use visitor_kiosk::capture::{record_filename, PersistenceOutcome, VisitorStore};
use visitor_kiosk::core::time::TimeProvider;
use visitor_kiosk::decoder::{
    DecodeAttempt, DecodeStream, DecoderError, DecoderFactory, DecoderOptions, QrDecoder,
};
use visitor_kiosk::scanner::{ScanDependencies, ScanLifecycle, ScannerHandle, ScannerState};
use visitor_kiosk::visitor::VisitorIdentity;

/// Let spawned tasks run without advancing time
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Wait (bounded) until the scanner publishes a matching state.
///
/// Only for tests running on the real clock; a paused clock would jump
/// straight through the timeout.
pub async fn wait_for_state<F>(scanner: &ScannerHandle, predicate: F) -> ScannerState
where
    F: FnMut(&ScannerState) -> bool,
{
    let mut states = scanner.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), states.wait_for(predicate))
        .await
        .expect("timed out waiting for scanner state")
        .expect("scanner task ended");
    state.clone()
}

/// Video element that never has a frame
pub struct BlankVideo;

impl VideoSource for BlankVideo {
    fn native_size(&self) -> Option<(u32, u32)> {
        None
    }

    fn current_frame(&self) -> Option<Frame> {
        None
    }
}

/// Clock stuck at one instant
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at_millis(millis: i64) -> Self {
        Self(DateTime::from_timestamp_millis(millis).expect("valid timestamp"))
    }
}

impl TimeProvider for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct DecoderCounters {
    bound: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    fail_start: AtomicBool,
}

/// Decoder factory whose decoders report whatever the test emits
#[derive(Clone)]
pub struct ScriptedDecoders {
    feed: broadcast::Sender<DecodeAttempt>,
    counters: Arc<DecoderCounters>,
}

impl ScriptedDecoders {
    pub fn new() -> Self {
        let (feed, _) = broadcast::channel(32);
        Self {
            feed,
            counters: Arc::new(DecoderCounters::default()),
        }
    }

    pub fn emit(&self, text: &str) {
        let _ = self.feed.send(DecodeAttempt::found(text));
    }

    pub fn emit_empty(&self) {
        let _ = self.feed.send(DecodeAttempt::Empty);
    }

    pub fn fail_next_start(&self) {
        self.counters.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn bound(&self) -> usize {
        self.counters.bound.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.counters.max_live.load(Ordering::SeqCst)
    }
}

impl DecoderFactory for ScriptedDecoders {
    fn bind(&self, _source: Arc<dyn VideoSource>, _options: DecoderOptions) -> Box<dyn QrDecoder> {
        self.counters.bound.fetch_add(1, Ordering::SeqCst);
        Box::new(ScriptedDecoder {
            feed: self.feed.clone(),
            counters: self.counters.clone(),
            running: false,
        })
    }
}

struct ScriptedDecoder {
    feed: broadcast::Sender<DecodeAttempt>,
    counters: Arc<DecoderCounters>,
    running: bool,
}

#[async_trait]
impl QrDecoder for ScriptedDecoder {
    async fn start(&mut self) -> Result<DecodeStream, DecoderError> {
        if self.counters.fail_start.swap(false, Ordering::SeqCst) {
            return Err(DecoderError::StartFailed("camera busy".into()));
        }
        self.running = true;
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_live.fetch_max(live, Ordering::SeqCst);

        let rx = self.feed.subscribe();
        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.ok().map(|attempt| (attempt, rx))
        })
        .boxed())
    }

    fn destroy(&mut self) {
        if std::mem::take(&mut self.running) {
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// In-memory visitor store
#[derive(Default)]
pub struct RecordingStore {
    pub images: Mutex<Vec<(String, usize)>>,
    pub records: Mutex<Vec<(VisitorIdentity, DateTime<Utc>)>>,
    pub record_delay: Option<Duration>,
}

impl RecordingStore {
    pub fn with_record_delay(delay: Duration) -> Self {
        Self {
            record_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl VisitorStore for RecordingStore {
    async fn persist_image(&self, bytes: &[u8], filename: &str) -> PersistenceOutcome {
        self.images
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.len()));
        Ok(PathBuf::from(filename))
    }

    async fn persist_record(
        &self,
        visitor: &VisitorIdentity,
        timestamp: DateTime<Utc>,
    ) -> PersistenceOutcome {
        if let Some(delay) = self.record_delay {
            tokio::time::sleep(delay).await;
        }
        self.records
            .lock()
            .unwrap()
            .push((visitor.clone(), timestamp));
        Ok(PathBuf::from(record_filename(visitor, timestamp)))
    }
}

/// Attendance service that remembers who it was asked about
#[derive(Default)]
pub struct RecordingAttendance {
    pub visitors: Mutex<Vec<VisitorIdentity>>,
    pub fail: bool,
}

impl RecordingAttendance {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.visitors
            .lock()
            .unwrap()
            .iter()
            .map(|v| v.id().to_string())
            .collect()
    }
}

#[async_trait]
impl AttendanceService for RecordingAttendance {
    async fn update_attendance(&self, visitor: &VisitorIdentity) -> Result<(), AttendanceError> {
        self.visitors.lock().unwrap().push(visitor.clone());
        if self.fail {
            return Err(AttendanceError::Api {
                status: 404,
                message: "object_not_found".into(),
            });
        }
        Ok(())
    }
}

/// Scanner wired to in-memory fakes
pub struct Rig {
    pub scanner: ScannerHandle,
    pub decoders: ScriptedDecoders,
    pub store: Arc<RecordingStore>,
    pub attendance: Arc<RecordingAttendance>,
    pub clock: DateTime<Utc>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with(RecordingStore::default(), RecordingAttendance::default())
    }

    pub fn with(store: RecordingStore, attendance: RecordingAttendance) -> Self {
        let decoders = ScriptedDecoders::new();
        let store = Arc::new(store);
        let attendance = Arc::new(attendance);
        let clock = FixedClock::at_millis(1_717_200_000_123);
        let now = clock.0;

        let scanner = ScanLifecycle::spawn(ScanDependencies {
            decoders: Arc::new(decoders.clone()),
            store: store.clone(),
            attendance: attendance.clone(),
            clock: Arc::new(clock),
        });

        Self {
            scanner,
            decoders,
            store,
            attendance,
            clock: now,
        }
    }

    pub async fn start(&self) -> ScannerState {
        self.scanner.start_scanning(Arc::new(BlankVideo)).await
    }

    pub async fn scan(&self, text: &str) {
        self.decoders.emit(text);
        settle().await;
    }
}
