use boardshelf_core::repo::board_repo::{BoardRepoError, BoardRepoResult};
use boardshelf_core::service::autosave::SnapshotSink;
use boardshelf_core::{AutoSaveBridge, CanvasSnapshot, CanvasSurface, SaveOutcome, SceneCapture};
use serde_json::{json, Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

const DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Default)]
struct RecordingSink {
    writes: Rc<RefCell<Vec<(String, CanvasSnapshot)>>>,
    fail: Rc<Cell<bool>>,
}

impl RecordingSink {
    fn count(&self) -> usize {
        self.writes.borrow().len()
    }
}

impl SnapshotSink for RecordingSink {
    fn persist_snapshot(&self, board_id: &str, snapshot: &CanvasSnapshot) -> BoardRepoResult<()> {
        if self.fail.get() {
            return Err(BoardRepoError::InvalidData("disk full".to_string()));
        }
        self.writes
            .borrow_mut()
            .push((board_id.to_string(), snapshot.clone()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakeCanvas {
    scene: Rc<RefCell<Option<SceneCapture>>>,
}

impl FakeCanvas {
    fn draw(&self, element_count: usize) {
        let elements = (0..element_count)
            .map(|n| json!({"id": format!("e{n}"), "type": "rectangle"}))
            .collect();
        *self.scene.borrow_mut() = Some(SceneCapture {
            elements,
            app_state: Map::new(),
            files: Map::new(),
        });
    }

    fn select(&self, element_id: &str) {
        if let Some(scene) = self.scene.borrow_mut().as_mut() {
            let mut selected = Map::new();
            selected.insert(element_id.to_string(), json!(true));
            scene
                .app_state
                .insert("selectedElementIds".to_string(), Value::Object(selected));
        }
    }
}

impl CanvasSurface for FakeCanvas {
    fn capture(&self) -> Option<SceneCapture> {
        self.scene.borrow().clone()
    }
}

fn ready_bridge(canvas: &FakeCanvas) -> (AutoSaveBridge<RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let mut bridge = AutoSaveBridge::new(sink.clone(), DELAY);
    bridge.mount("b1", Box::new(canvas.clone()));
    bridge.mark_ready(None);
    (bridge, sink)
}

#[test]
fn burst_of_changes_within_window_writes_once() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    let start = Instant::now();

    for step in 0..5u64 {
        let now = start + Duration::from_millis(step * 200);
        canvas.draw(step as usize + 1);
        assert!(bridge.notify_change(now));
        assert_eq!(bridge.poll(now).unwrap(), SaveOutcome::NotDue);
    }

    let quiet = start + Duration::from_millis(800) + DELAY;
    assert_eq!(bridge.poll(quiet).unwrap(), SaveOutcome::Written);
    assert_eq!(bridge.poll(quiet + DELAY).unwrap(), SaveOutcome::NotDue);
    assert_eq!(sink.count(), 1);
    assert_eq!(
        sink.writes.borrow()[0].1.as_value()["elements"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
}

#[test]
fn changes_spaced_beyond_delay_write_each_time() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    let start = Instant::now();

    for step in 0..3u32 {
        let now = start + DELAY * (step * 2);
        canvas.draw(step as usize + 1);
        bridge.notify_change(now);
        assert_eq!(bridge.poll(now + DELAY).unwrap(), SaveOutcome::Written);
    }

    assert_eq!(sink.count(), 3);
}

#[test]
fn repeated_flush_without_change_writes_once() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    canvas.draw(2);
    bridge.notify_change(Instant::now());

    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Written);
    assert!(!bridge.has_pending());
    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Unchanged);
    assert_eq!(sink.count(), 1);
}

#[test]
fn transient_view_state_does_not_trigger_writes() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    canvas.draw(1);
    bridge.flush().unwrap();

    canvas.select("e0");
    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Unchanged);
    assert_eq!(sink.count(), 1);
}

#[test]
fn changes_before_ready_are_ignored() {
    let canvas = FakeCanvas::default();
    let sink = RecordingSink::default();
    let mut bridge = AutoSaveBridge::new(sink.clone(), DELAY);
    bridge.mount("b1", Box::new(canvas.clone()));
    canvas.draw(1);

    assert!(!bridge.notify_change(Instant::now()));
    assert!(!bridge.has_pending());
    assert_eq!(bridge.flush().unwrap(), SaveOutcome::NotReady);
    assert_eq!(sink.count(), 0);
}

#[test]
fn flush_without_canvas_is_a_noop() {
    let mut bridge = AutoSaveBridge::new(RecordingSink::default(), DELAY);

    assert_eq!(bridge.flush().unwrap(), SaveOutcome::NoCanvas);
    assert!(!bridge.notify_change(Instant::now()));
}

#[test]
fn seeded_fingerprint_skips_rewriting_loaded_content() {
    let canvas = FakeCanvas::default();
    canvas.draw(3);
    let loaded = canvas.capture().unwrap().into_snapshot();
    let sink = RecordingSink::default();
    let mut bridge = AutoSaveBridge::new(sink.clone(), DELAY);
    bridge.mount("b1", Box::new(canvas.clone()));

    bridge.mark_ready(Some(&loaded));

    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Unchanged);
    assert_eq!(sink.count(), 0);
}

#[test]
fn failed_write_keeps_previous_fingerprint() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    canvas.draw(1);
    sink.fail.set(true);

    assert!(bridge.flush().is_err());

    sink.fail.set(false);
    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Written);
    assert_eq!(sink.count(), 1);
}

#[test]
fn remount_drops_pending_timer_and_cache() {
    let canvas = FakeCanvas::default();
    let (mut bridge, sink) = ready_bridge(&canvas);
    canvas.draw(1);
    bridge.flush().unwrap();
    let now = Instant::now();
    bridge.notify_change(now);

    bridge.mount("b2", Box::new(canvas.clone()));

    assert!(!bridge.has_pending());
    assert!(!bridge.is_ready());
    assert_eq!(bridge.poll(now + DELAY).unwrap(), SaveOutcome::NotDue);
    bridge.mark_ready(None);
    assert_eq!(bridge.flush().unwrap(), SaveOutcome::Written);
    let writes = sink.writes.borrow();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[1].0, "b2");
}
