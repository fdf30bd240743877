//! 换班倒计时与轮换确认
//!
//! 倒计时结束后冻结，记录到期时看到的追踪 ID，只有换成另一张脸才能确认。
//! 追踪 ID 只是"同一人"的近似：检测器重识别窗口内的快速换回无法识别。

use serde::Serialize;
use thiserror::Error;

use crate::engine::config::ShiftConfig;
use crate::engine::types::TrackingId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum ShiftPhase {
    Idle,
    Counting { started_at: i64 },
    AwaitingRotation { pending: Option<TrackingId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum ShiftTick {
    /// 倒计时未运行（未开始或等待确认），本次 tick 不做任何事
    Inactive,
    Remaining { remaining_ms: i64 },
    Expired { pending: Option<TrackingId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "camelCase", tag = "reason")]
pub enum AckRejection {
    #[error("No shift rotation is pending.")]
    NotPending,
    #[error("Face not detected. Please face the camera.")]
    FaceNotDetected,
    #[error("Same operator detected. Please switch.")]
    SameOperator { tracking_id: TrackingId },
}

#[derive(Debug, Clone)]
pub struct ShiftGate {
    phase: ShiftPhase,
    last_observed: Option<TrackingId>,
    current: Option<TrackingId>,
}

impl Default for ShiftGate {
    fn default() -> Self {
        Self {
            phase: ShiftPhase::Idle,
            last_observed: None,
            current: None,
        }
    }
}

impl ShiftGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ShiftPhase {
        self.phase
    }

    pub fn is_awaiting_rotation(&self) -> bool {
        matches!(self.phase, ShiftPhase::AwaitingRotation { .. })
    }

    pub fn pending_tracking_id(&self) -> Option<TrackingId> {
        match self.phase {
            ShiftPhase::AwaitingRotation { pending } => pending,
            _ => None,
        }
    }

    /// Most recent non-null tracking id seen on any frame.
    pub fn last_observed(&self) -> Option<TrackingId> {
        self.last_observed
    }

    /// Tracking id of the latest frame, `None` when that frame had no tracked face.
    pub fn current(&self) -> Option<TrackingId> {
        self.current
    }

    pub fn observe(&mut self, tracking_id: Option<TrackingId>) {
        self.current = tracking_id;
        if tracking_id.is_some() {
            self.last_observed = tracking_id;
        }
    }

    /// (Re)starts the countdown and drops any pending rotation.
    pub fn start(&mut self, now: i64) {
        self.phase = ShiftPhase::Counting { started_at: now };
    }

    pub fn remaining_ms(&self, now: i64, config: &ShiftConfig) -> Option<i64> {
        match self.phase {
            ShiftPhase::Idle => None,
            ShiftPhase::Counting { started_at } => {
                Some((config.duration_ms - (now - started_at)).max(0))
            }
            ShiftPhase::AwaitingRotation { .. } => Some(0),
        }
    }

    pub fn tick(&mut self, now: i64, config: &ShiftConfig) -> ShiftTick {
        let ShiftPhase::Counting { started_at } = self.phase else {
            return ShiftTick::Inactive;
        };

        let remaining_ms = (config.duration_ms - (now - started_at)).max(0);
        if remaining_ms > 0 {
            return ShiftTick::Remaining { remaining_ms };
        }

        let pending = self.last_observed;
        self.phase = ShiftPhase::AwaitingRotation { pending };
        ShiftTick::Expired { pending }
    }

    /// Validates a rotation acknowledgment against the tracking id the
    /// request carries; on success the countdown restarts from `now`.
    pub fn acknowledge(
        &mut self,
        current: Option<TrackingId>,
        now: i64,
    ) -> Result<(), AckRejection> {
        let ShiftPhase::AwaitingRotation { pending } = self.phase else {
            return Err(AckRejection::NotPending);
        };

        let (Some(pending), Some(current)) = (pending, current) else {
            return Err(AckRejection::FaceNotDetected);
        };

        if pending == current {
            return Err(AckRejection::SameOperator {
                tracking_id: current,
            });
        }

        self.start(now);
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ShiftConfig {
        ShiftConfig {
            duration_ms: 10_000,
            alert_tone_ms: 500,
        }
    }

    fn expired_gate(operator: Option<i64>) -> ShiftGate {
        let mut gate = ShiftGate::new();
        gate.observe(operator.map(TrackingId));
        gate.start(0);
        assert!(matches!(gate.tick(10_000, &cfg()), ShiftTick::Expired { .. }));
        gate
    }

    #[test]
    fn idle_gate_does_not_tick() {
        let mut gate = ShiftGate::new();
        assert_eq!(gate.tick(5_000, &cfg()), ShiftTick::Inactive);
        assert_eq!(gate.remaining_ms(5_000, &cfg()), None);
    }

    #[test]
    fn counts_down_then_freezes() {
        let mut gate = ShiftGate::new();
        gate.observe(Some(TrackingId(3)));
        gate.start(1_000);

        assert_eq!(
            gate.tick(4_000, &cfg()),
            ShiftTick::Remaining { remaining_ms: 7_000 }
        );
        assert_eq!(
            gate.tick(11_500, &cfg()),
            ShiftTick::Expired {
                pending: Some(TrackingId(3))
            }
        );
        assert_eq!(gate.tick(12_500, &cfg()), ShiftTick::Inactive);
        assert_eq!(gate.remaining_ms(99_000, &cfg()), Some(0));
        assert_eq!(gate.pending_tracking_id(), Some(TrackingId(3)));
    }

    #[test]
    fn tracking_id_is_sticky_across_faceless_frames() {
        let mut gate = ShiftGate::new();
        gate.observe(Some(TrackingId(9)));
        gate.observe(None);
        assert_eq!(gate.last_observed(), Some(TrackingId(9)));
        assert_eq!(gate.current(), None);
    }

    #[test]
    fn same_operator_is_rejected() {
        let mut gate = expired_gate(Some(5));
        let err = gate.acknowledge(Some(TrackingId(5)), 12_000).unwrap_err();
        assert_eq!(
            err,
            AckRejection::SameOperator {
                tracking_id: TrackingId(5)
            }
        );
        assert!(gate.is_awaiting_rotation());
    }

    #[test]
    fn missing_ids_are_rejected() {
        let mut gate = expired_gate(Some(5));
        assert_eq!(
            gate.acknowledge(None, 12_000),
            Err(AckRejection::FaceNotDetected)
        );

        let mut gate = expired_gate(None);
        assert_eq!(
            gate.acknowledge(Some(TrackingId(6)), 12_000),
            Err(AckRejection::FaceNotDetected)
        );
        assert!(gate.is_awaiting_rotation());
    }

    #[test]
    fn different_operator_restarts_countdown() {
        let mut gate = expired_gate(Some(5));
        gate.acknowledge(Some(TrackingId(6)), 12_000).unwrap();
        assert_eq!(gate.pending_tracking_id(), None);
        assert_eq!(gate.phase(), ShiftPhase::Counting { started_at: 12_000 });
        assert_eq!(gate.remaining_ms(13_000, &cfg()), Some(9_000));
    }

    #[test]
    fn acknowledge_without_pending_rotation() {
        let mut gate = ShiftGate::new();
        gate.start(0);
        assert_eq!(
            gate.acknowledge(Some(TrackingId(1)), 100),
            Err(AckRejection::NotPending)
        );
    }

    #[test]
    fn rejection_messages_are_operator_prompts() {
        assert_eq!(
            AckRejection::FaceNotDetected.to_string(),
            "Face not detected. Please face the camera."
        );
        assert_eq!(
            AckRejection::SameOperator {
                tracking_id: TrackingId(1)
            }
            .to_string(),
            "Same operator detected. Please switch."
        );
    }
}
