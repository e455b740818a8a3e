//! Side effects of a successful scan

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::attendance::AttendanceService;
use crate::camera::VideoSource;
use crate::capture::{capture_frame, image_filename, VisitorStore};
use crate::core::error_handling::warn_with_context;
use crate::visitor::VisitorIdentity;

/// Capture, persistence and the remote attendance update for one scan.
///
/// Steps run in order and each failure is logged without stopping the
/// remaining steps. Nothing here feeds back into scanner state.
#[derive(Clone)]
pub struct SuccessEffects {
    video: Option<Arc<dyn VideoSource>>,
    store: Arc<dyn VisitorStore>,
    attendance: Arc<dyn AttendanceService>,
}

impl SuccessEffects {
    pub fn new(
        video: Option<Arc<dyn VideoSource>>,
        store: Arc<dyn VisitorStore>,
        attendance: Arc<dyn AttendanceService>,
    ) -> Self {
        Self {
            video,
            store,
            attendance,
        }
    }

    pub async fn run(self, visitor: VisitorIdentity, timestamp: DateTime<Utc>) {
        if let Some(bytes) = self.capture().await {
            let filename = image_filename(&visitor, timestamp);
            match self.store.persist_image(&bytes, &filename).await {
                Ok(path) => log::info!("Saved visitor image {}", path.display()),
                Err(e) => warn_with_context(&e, "Image save failed"),
            }
        }

        match self.store.persist_record(&visitor, timestamp).await {
            Ok(path) => log::info!("Saved visitor record {}", path.display()),
            Err(e) => warn_with_context(&e, "Visitor record save failed"),
        }

        if let Err(e) = self.attendance.update_attendance(&visitor).await {
            warn_with_context(&e, &format!("Attendance update failed for {}", visitor));
        }
    }

    async fn capture(&self) -> Option<Vec<u8>> {
        let video = self.video.as_ref()?;
        let bytes = capture_frame(video.as_ref()).await;
        if bytes.is_none() {
            log::debug!("No frame available, skipping image capture");
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceError;
    use crate::camera::Frame;
    use crate::capture::{PersistenceError, PersistenceOutcome};
    use crate::visitor::parse;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal(Mutex<Vec<String>>);

    impl Journal {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }
        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Store {
        journal: Arc<Journal>,
        fail_images: bool,
    }

    #[async_trait]
    impl VisitorStore for Store {
        async fn persist_image(&self, _bytes: &[u8], filename: &str) -> PersistenceOutcome {
            self.journal.push(format!("image:{filename}"));
            if self.fail_images {
                return Err(PersistenceError::Encode {
                    message: "disk full".into(),
                });
            }
            Ok(PathBuf::from(filename))
        }

        async fn persist_record(
            &self,
            visitor: &VisitorIdentity,
            _timestamp: DateTime<Utc>,
        ) -> PersistenceOutcome {
            self.journal.push(format!("record:{}", visitor.id()));
            Ok(PathBuf::from("record.json"))
        }
    }

    struct Attendance(Arc<Journal>);

    #[async_trait]
    impl AttendanceService for Attendance {
        async fn update_attendance(&self, visitor: &VisitorIdentity) -> Result<(), AttendanceError> {
            self.0.push(format!("attendance:{}", visitor.id()));
            Err(AttendanceError::NotConfigured {
                setting: "NOTION_API_TOKEN",
            })
        }
    }

    struct Still;

    impl VideoSource for Still {
        fn native_size(&self) -> Option<(u32, u32)> {
            Some((2, 2))
        }
        fn current_frame(&self) -> Option<Frame> {
            Some(Frame {
                width: 2,
                height: 2,
                rgb: vec![128; 12],
            })
        }
    }

    fn effects(journal: &Arc<Journal>, video: Option<Arc<dyn VideoSource>>, fail_images: bool) -> SuccessEffects {
        SuccessEffects::new(
            video,
            Arc::new(Store {
                journal: journal.clone(),
                fail_images,
            }),
            Arc::new(Attendance(journal.clone())),
        )
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let journal = Arc::new(Journal::default());
        let visitor = parse("Ada.42").unwrap();
        let timestamp = DateTime::from_timestamp_millis(1_000).unwrap();

        effects(&journal, Some(Arc::new(Still)), false)
            .run(visitor, timestamp)
            .await;

        assert_eq!(
            journal.entries(),
            vec!["image:visitor_42_1000.jpg", "record:42", "attendance:42"]
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_steps() {
        let journal = Arc::new(Journal::default());
        let visitor = parse("Ada.42").unwrap();

        effects(&journal, Some(Arc::new(Still)), true)
            .run(visitor, Utc::now())
            .await;

        let entries = journal.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], "record:42");
        assert_eq!(entries[2], "attendance:42");
    }

    #[tokio::test]
    async fn test_missing_video_skips_image() {
        let journal = Arc::new(Journal::default());

        effects(&journal, None, false)
            .run(parse("Ada.42").unwrap(), Utc::now())
            .await;

        assert_eq!(journal.entries(), vec!["record:42", "attendance:42"]);
    }

    #[tokio::test]
    async fn test_unwritable_store_and_missing_database_are_warnings() {
        use crate::attendance::{AttendanceConfig, AttendanceUpdater};
        use crate::capture::LocalStore;
        use crate::core::error_handling::recoverable_message;

        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("not-a-directory");
        std::fs::write(&blocked, b"").unwrap();
        let store = Arc::new(LocalStore::new(&blocked));
        let attendance = Arc::new(AttendanceUpdater::from_config(&AttendanceConfig::default()));
        let visitor = parse("Ada.42").unwrap();

        SuccessEffects::new(Some(Arc::new(Still)), store.clone(), attendance.clone())
            .run(visitor.clone(), Utc::now())
            .await;

        let save = store.persist_record(&visitor, Utc::now()).await.unwrap_err();
        assert_eq!(
            recoverable_message(&save, "Visitor record save failed"),
            "Visitor record save failed: The output directory cannot be created or written"
        );
        let update = attendance.update_attendance(&visitor).await.unwrap_err();
        let line = recoverable_message(&update, "Attendance update failed");
        assert_eq!(line, "Attendance update failed: NOTION_DATABASE_ID is not set");
        assert!(!line.contains("FATAL"));
        assert!(blocked.is_file());
    }
}
