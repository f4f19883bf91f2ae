//! Debounced canvas snapshot persistence.
//!
//! # Responsibility
//! - Coalesce bursts of canvas change notifications into one write.
//! - Skip writes whose content matches the last persisted fingerprint.
//! - Provide a synchronous `flush` for board switches and export.
//!
//! # Invariants
//! - At most one canvas is mounted; mounting resets timer, ready flag and
//!   fingerprint cache.
//! - Notifications before the canvas reports ready are ignored.
//! - The cached fingerprint only moves after the sink accepted the write.
//! - Time is supplied by the caller; nothing here sleeps or spawns.

use crate::model::board::BoardId;
use crate::model::snapshot::{CanvasSnapshot, Fingerprint, SceneCapture};
use crate::repo::board_repo::{BoardRepoResult, BoardRepository};
use log::{debug, error, info};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Quiet period between the last change and the write.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

/// Drawing surface the bridge pulls scene state from.
pub trait CanvasSurface {
    /// Current scene, `None` when the surface has nothing to offer yet.
    fn capture(&self) -> Option<SceneCapture>;
}

/// Destination of persisted snapshots.
pub trait SnapshotSink {
    fn persist_snapshot(&self, board_id: &str, snapshot: &CanvasSnapshot) -> BoardRepoResult<()>;
}

impl<R: BoardRepository> SnapshotSink for R {
    fn persist_snapshot(&self, board_id: &str, snapshot: &CanvasSnapshot) -> BoardRepoResult<()> {
        self.save_snapshot(board_id, snapshot)
    }
}

/// Single-shot deadline that restarts on every schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arms the timer; a pending deadline is replaced.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns `true` once `now` reached the deadline.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Last persisted fingerprint per board.
#[derive(Debug, Default, Clone)]
pub struct FingerprintCache {
    entries: HashMap<BoardId, Fingerprint>,
}

impl FingerprintCache {
    pub fn get(&self, board_id: &str) -> Option<&Fingerprint> {
        self.entries.get(board_id)
    }

    pub fn matches(&self, board_id: &str, fingerprint: &Fingerprint) -> bool {
        self.get(board_id) == Some(fingerprint)
    }

    pub fn insert(&mut self, board_id: impl Into<BoardId>, fingerprint: Fingerprint) {
        self.entries.insert(board_id.into(), fingerprint);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Snapshot handed to the sink.
    Written,
    /// Content matches the last persisted fingerprint.
    Unchanged,
    /// No canvas is mounted.
    NoCanvas,
    /// Canvas mounted but not ready.
    NotReady,
    /// Timer not armed or not yet due.
    NotDue,
    /// Surface returned no scene.
    NoCapture,
}

struct MountedCanvas {
    board_id: BoardId,
    surface: Box<dyn CanvasSurface>,
    ready: bool,
}

/// Autosave bridge between one mounted canvas and a snapshot sink.
pub struct AutoSaveBridge<K: SnapshotSink> {
    sink: K,
    timer: DebounceTimer,
    canvas: Option<MountedCanvas>,
    fingerprints: FingerprintCache,
}

impl<K: SnapshotSink> AutoSaveBridge<K> {
    pub fn new(sink: K, delay: Duration) -> Self {
        Self {
            sink,
            timer: DebounceTimer::new(delay),
            canvas: None,
            fingerprints: FingerprintCache::default(),
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Attaches the canvas for `board_id`, replacing any previous one.
    ///
    /// Pending work of the previous canvas is dropped; callers flush first.
    pub fn mount(&mut self, board_id: impl Into<BoardId>, surface: Box<dyn CanvasSurface>) {
        self.reset();
        self.canvas = Some(MountedCanvas {
            board_id: board_id.into(),
            surface,
            ready: false,
        });
        debug!("event=canvas_mount module=autosave status=ok");
    }

    pub fn unmount(&mut self) {
        self.reset();
        self.canvas = None;
    }

    pub fn mounted_board_id(&self) -> Option<&str> {
        self.canvas.as_ref().map(|canvas| canvas.board_id.as_str())
    }

    /// Marks the mounted canvas ready and optionally seeds the cache with
    /// the snapshot it was loaded from.
    pub fn mark_ready(&mut self, initial: Option<&CanvasSnapshot>) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        canvas.ready = true;
        if let Some(snapshot) = initial {
            self.fingerprints
                .insert(canvas.board_id.clone(), snapshot.fingerprint());
        }
    }

    pub fn is_ready(&self) -> bool {
        self.canvas.as_ref().is_some_and(|canvas| canvas.ready)
    }

    /// Records a canvas change at `now`. Returns whether the timer was armed.
    pub fn notify_change(&mut self, now: Instant) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.timer.schedule(now);
        true
    }

    pub fn has_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn pending_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Saves when the debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> BoardRepoResult<SaveOutcome> {
        if !self.timer.take_due(now) {
            return Ok(SaveOutcome::NotDue);
        }
        self.save_now()
    }

    /// Cancels the timer and saves synchronously.
    pub fn flush(&mut self) -> BoardRepoResult<SaveOutcome> {
        self.timer.cancel();
        self.save_now()
    }

    /// Current persisted-form snapshot of the mounted canvas.
    pub fn capture_snapshot(&self) -> Option<CanvasSnapshot> {
        let canvas = self.canvas.as_ref()?;
        canvas.surface.capture().map(SceneCapture::into_snapshot)
    }

    fn save_now(&mut self) -> BoardRepoResult<SaveOutcome> {
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(SaveOutcome::NoCanvas);
        };
        if !canvas.ready {
            return Ok(SaveOutcome::NotReady);
        }
        let Some(scene) = canvas.surface.capture() else {
            return Ok(SaveOutcome::NoCapture);
        };

        let snapshot = scene.into_snapshot();
        let fingerprint = snapshot.fingerprint();
        if self.fingerprints.matches(&canvas.board_id, &fingerprint) {
            debug!("event=snapshot_save module=autosave status=skip reason=unchanged");
            return Ok(SaveOutcome::Unchanged);
        }

        if let Err(err) = self.sink.persist_snapshot(&canvas.board_id, &snapshot) {
            error!(
                "event=snapshot_save module=autosave status=error error={}",
                err
            );
            return Err(err);
        }
        info!(
            "event=snapshot_save module=autosave status=ok fingerprint={}",
            &fingerprint.as_str()[..12]
        );
        self.fingerprints.insert(canvas.board_id.clone(), fingerprint);
        Ok(SaveOutcome::Written)
    }

    fn reset(&mut self) {
        self.timer.cancel();
        self.fingerprints.clear();
    }
}
