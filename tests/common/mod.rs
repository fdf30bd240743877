#![allow(dead_code)]

use std::sync::Arc;

use screeneye::engine::config::EngineConfig;
use screeneye::engine::events::MemorySink;
use screeneye::engine::session::{AttentionEngine, FrameOutcome};
use screeneye::engine::types::{FaceSignal, FrameSignal};
use screeneye::store::Store;

pub const FRAME_INTERVAL_MS: i64 = 100;

pub fn engine() -> (AttentionEngine, Arc<MemorySink>) {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> (AttentionEngine, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (AttentionEngine::new(config, sink.clone()), sink)
}

pub fn face(yaw: f64, pitch: f64) -> FrameSignal {
    FrameSignal::with_face(FaceSignal::new(yaw, pitch).with_tracking_id(1))
}

pub fn operator(tracking_id: i64) -> FrameSignal {
    FrameSignal::with_face(FaceSignal::new(0.0, 0.0).with_tracking_id(tracking_id))
}

/// Starts the session at `start` and feeds frontal frames until the baseline
/// is set. Returns the completion timestamp.
pub fn calibrate_from(engine: &mut AttentionEngine, start: i64, frame: &FrameSignal) -> i64 {
    engine.start(start);
    feed_until_calibrated(engine, start, frame)
}

pub fn feed_until_calibrated(engine: &mut AttentionEngine, start: i64, frame: &FrameSignal) -> i64 {
    let mut now = start;
    loop {
        if let FrameOutcome::Calibrated { .. } = engine.process_frame(frame, now) {
            return now;
        }
        now += FRAME_INTERVAL_MS;
    }
}

pub fn setup_store(db_name: &str) -> (tempfile::TempDir, Arc<Store>) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let db_path = temp_dir.path().join(db_name);
    let store = Arc::new(Store::open(db_path.to_str().expect("db path")).expect("open store"));
    (temp_dir, store)
}
