//! 注意力监测引擎
//!
//! 纯同步状态机：帧信号进来，事件、提示音请求与视图快照出去。
//! 时间全部由调用方以毫秒传入，便于测试。

pub mod alert;
pub mod calibration;
pub mod classifier;
pub mod config;
pub mod events;
pub mod session;
pub mod shift;
pub mod stats;
pub mod types;
pub mod view;

pub use alert::{AlertTransition, AlertUpdate, VisualAlert};
pub use calibration::CalibrationStep;
pub use config::EngineConfig;
pub use events::{Event, EventKind, EventSink, MemorySink, NullSink};
pub use session::{AttentionEngine, FrameOutcome, ShiftUpdate};
pub use shift::{AckRejection, ShiftTick};
pub use types::{
    AlertLevel, Baseline, FaceSignal, FrameSignal, Gaze, ToneKind, ToneRequest, TrackingId,
};
pub use view::{SessionPhase, SessionView};
