use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::engine::types::{AlertLevel, TrackingId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    CalibrationStart,
    CalibrationComplete,
    AlertStart,
    AlertStop,
    LookAwayStart,
    LookAwayEnd,
    ShiftAlert,
    ShiftAck,
    ShiftSameOperator,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CalibrationStart => "CALIBRATION_START",
            Self::CalibrationComplete => "CALIBRATION_COMPLETE",
            Self::AlertStart => "ALERT_START",
            Self::AlertStop => "ALERT_STOP",
            Self::LookAwayStart => "LOOK_AWAY_START",
            Self::LookAwayEnd => "LOOK_AWAY_END",
            Self::ShiftAlert => "SHIFT_ALERT",
            Self::ShiftAck => "SHIFT_ACK",
            Self::ShiftSameOperator => "SHIFT_SAME_OPERATOR",
        }
    }
}

/// 状态转换事件，写入后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub timestamp_ms: i64,
    pub kind: EventKind,
    pub message: Option<String>,
    pub duration_ms: Option<i64>,
}

impl Event {
    pub fn new(timestamp_ms: i64, kind: EventKind) -> Self {
        Self {
            timestamp_ms,
            kind,
            message: None,
            duration_ms: None,
        }
    }

    pub fn alert_start(timestamp_ms: i64, level: AlertLevel) -> Self {
        Self {
            message: Some(level.as_str().to_string()),
            ..Self::new(timestamp_ms, EventKind::AlertStart)
        }
    }

    pub fn look_away_end(timestamp_ms: i64, duration_ms: i64) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            ..Self::new(timestamp_ms, EventKind::LookAwayEnd)
        }
    }

    pub fn same_operator(timestamp_ms: i64, tracking_id: TrackingId) -> Self {
        Self {
            message: Some(format!("tracking_id={tracking_id}")),
            ..Self::new(timestamp_ms, EventKind::ShiftSameOperator)
        }
    }
}

/// Append-only destination for engine events. Implementations must not block
/// the caller; persistence happens elsewhere.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
