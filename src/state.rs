use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::engine::session::{AttentionEngine, FrameOutcome, ShiftUpdate};
use crate::engine::shift::AckRejection;
use crate::engine::types::FrameSignal;
use crate::engine::view::SessionView;
use crate::feedback::Feedback;

/// 同一时刻最多一帧在处理；新帧在忙时直接丢弃，不排队
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn try_acquire(self: &Arc<Self>) -> Option<FramePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| FramePermit { gate: self.clone() })
    }
}

/// Holds the frame slot; released on drop.
#[derive(Debug)]
pub struct FramePermit {
    gate: Arc<FrameGate>,
}

impl Drop for FramePermit {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::SeqCst);
    }
}

/// Single-writer owner of the engine shared between the frame path, the
/// shift ticker and the operator controls.
#[derive(Clone)]
pub struct SessionHandle {
    engine: Arc<Mutex<AttentionEngine>>,
    gate: Arc<FrameGate>,
    feedback: Arc<dyn Feedback>,
    dropped_frames: Arc<AtomicU64>,
}

impl SessionHandle {
    pub fn new(engine: AttentionEngine, feedback: Arc<dyn Feedback>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            gate: Arc::new(FrameGate::new()),
            feedback,
            dropped_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    // 引擎的每次修改都保持状态一致，中毒锁可以直接恢复
    fn lock(&self) -> MutexGuard<'_, AttentionEngine> {
        self.engine
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn start(&self, now: i64) -> bool {
        let (started, view) = {
            let mut engine = self.lock();
            let started = engine.start(now);
            (started, engine.snapshot(now))
        };
        self.feedback.present(&view);
        started
    }

    /// Claims the frame slot. `None` means a frame is still in flight and the
    /// caller should drop this one.
    pub fn try_begin_frame(&self) -> Option<FramePermit> {
        let permit = self.gate.try_acquire();
        if permit.is_none() {
            let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(dropped, "Frame dropped, previous frame still processing");
        }
        permit
    }

    pub fn commit_frame(&self, permit: FramePermit, frame: &FrameSignal, now: i64) -> FrameOutcome {
        let (outcome, view) = {
            let mut engine = self.lock();
            let outcome = engine.process_frame(frame, now);
            (outcome, engine.snapshot(now))
        };
        drop(permit);

        if let Some(tone) = outcome.tone() {
            self.feedback.play_tone(tone);
        }
        self.feedback.present(&view);
        outcome
    }

    pub fn submit_frame(&self, frame: &FrameSignal, now: i64) -> Option<FrameOutcome> {
        let permit = self.try_begin_frame()?;
        Some(self.commit_frame(permit, frame, now))
    }

    pub fn tick_shift(&self, now: i64) -> ShiftUpdate {
        let (update, view) = {
            let mut engine = self.lock();
            let update = engine.tick_shift(now);
            (update, engine.snapshot(now))
        };

        if let Some(tone) = update.tone {
            self.feedback.play_tone(tone);
        }
        self.feedback.present(&view);
        update
    }

    pub fn acknowledge_shift(&self, now: i64) -> Result<(), AckRejection> {
        let (result, view) = {
            let mut engine = self.lock();
            let result = engine.acknowledge_shift(now);
            (result, engine.snapshot(now))
        };
        self.feedback.present(&view);
        result
    }

    pub fn recalibrate(&self, now: i64) {
        let view = {
            let mut engine = self.lock();
            engine.recalibrate(now);
            engine.snapshot(now)
        };
        self.feedback.present(&view);
    }

    pub fn new_session(&self, now: i64) {
        let view = {
            let mut engine = self.lock();
            engine.new_session(now);
            engine.snapshot(now)
        };
        self.feedback.present(&view);
    }

    pub fn snapshot(&self, now: i64) -> SessionView {
        self.lock().snapshot(now)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    pub fn is_frame_in_flight(&self) -> bool {
        self.gate.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::EngineConfig;
    use crate::engine::events::NullSink;
    use crate::engine::types::{FaceSignal, ToneKind};
    use crate::engine::view::SessionPhase;
    use crate::feedback::RecordingFeedback;

    fn handle() -> (SessionHandle, Arc<RecordingFeedback>) {
        let feedback = Arc::new(RecordingFeedback::new());
        let engine = AttentionEngine::new(EngineConfig::default(), Arc::new(NullSink));
        (SessionHandle::new(engine, feedback.clone()), feedback)
    }

    fn face() -> FrameSignal {
        FrameSignal::with_face(FaceSignal::new(0.0, 0.0).with_tracking_id(1))
    }

    #[test]
    fn second_frame_is_dropped_while_first_in_flight() {
        let (handle, _) = handle();
        handle.start(0);

        let permit = handle.try_begin_frame().unwrap();
        assert!(handle.is_frame_in_flight());
        assert!(handle.try_begin_frame().is_none());
        assert!(handle.submit_frame(&face(), 10).is_none());
        assert_eq!(handle.dropped_frames(), 2);

        handle.commit_frame(permit, &face(), 20);
        assert!(!handle.is_frame_in_flight());
        assert!(handle.submit_frame(&face(), 30).is_some());
    }

    #[test]
    fn permit_released_on_drop() {
        let (handle, _) = handle();
        let permit = handle.try_begin_frame();
        drop(permit);
        assert!(handle.try_begin_frame().is_some());
    }

    #[test]
    fn tones_dispatched_after_processing() {
        let (handle, feedback) = handle();
        handle.start(0);
        let mut now = 0;
        while handle.snapshot(now).phase != SessionPhase::Monitoring {
            handle.submit_frame(&face(), now);
            now += 100;
        }

        handle.submit_frame(&FrameSignal::empty(), now + 2_500);
        let tones = feedback.tones();
        assert_eq!(tones.len(), 1);
        assert_eq!(tones[0].kind, ToneKind::Attention);
        assert_eq!(tones[0].duration_ms, 200);
        assert!(feedback.view_count() > 0);
        assert_eq!(
            feedback.last_view().map(|v| v.status),
            Some("Look away detected")
        );
    }

    #[test]
    fn shift_expiry_plays_shift_tone() {
        let (handle, feedback) = handle();
        handle.start(0);
        let mut now = 0;
        while handle.snapshot(now).phase != SessionPhase::Monitoring {
            handle.submit_frame(&face(), now);
            now += 100;
        }

        let update = handle.tick_shift(now + 10_000);
        assert!(update.tone.is_some());
        assert_eq!(feedback.tones().last().map(|t| t.kind), Some(ToneKind::ShiftAlert));
        assert!(handle.snapshot(now + 10_000).awaiting_rotation);
    }
}
