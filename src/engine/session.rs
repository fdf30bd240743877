use std::sync::Arc;

use serde::Serialize;

use crate::engine::alert::{AlertEscalator, AlertTransition, AlertUpdate, VisualAlert};
use crate::engine::calibration::{CalibrationStep, Calibrator};
use crate::engine::classifier::{self, AwayReason};
use crate::engine::config::EngineConfig;
use crate::engine::events::{Event, EventKind, EventSink};
use crate::engine::shift::{AckRejection, ShiftGate, ShiftTick};
use crate::engine::stats::{SessionStats, StatsTransition};
use crate::engine::types::*;
use crate::engine::view::{self, SessionPhase, SessionView, StatusLine};

const ROTATION_PROMPT: &str = "Please switch operator and acknowledge.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum FrameOutcome {
    /// 会话尚未开始，帧被忽略
    Ignored,
    Calibrating { step: CalibrationStep },
    Calibrated { baseline: Baseline },
    Classified {
        gaze: Gaze,
        away_reason: Option<AwayReason>,
        alert: AlertUpdate,
    },
}

impl FrameOutcome {
    pub fn tone(&self) -> Option<ToneRequest> {
        match self {
            Self::Classified { alert, .. } => alert.tone,
            _ => None,
        }
    }

    pub fn gaze(&self) -> Option<Gaze> {
        match self {
            Self::Classified { gaze, .. } => Some(*gaze),
            _ => None,
        }
    }

    pub fn alert_level(&self) -> Option<AlertLevel> {
        match self {
            Self::Classified { alert, .. } => Some(alert.level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftUpdate {
    pub tick: ShiftTick,
    pub tone: Option<ToneRequest>,
}

/// 注意力状态引擎：独占基线、校准累积器、告警状态、换班状态与会话统计。
///
/// 所有方法同步且不阻塞；事件通过 `EventSink` 以发后即忘的方式发出。
/// 多线程宿主需要自行串行化调用（见 `state::SessionHandle`）。
pub struct AttentionEngine {
    config: EngineConfig,
    sink: Arc<dyn EventSink>,
    phase: SessionPhase,
    calibrator: Calibrator,
    last_calibration: Option<CalibrationStep>,
    baseline: Option<Baseline>,
    alert: AlertEscalator,
    shift: ShiftGate,
    stats: SessionStats,
    status: StatusLine,
    last_rejection: Option<AckRejection>,
}

impl AttentionEngine {
    pub fn new(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink,
            phase: SessionPhase::NotStarted,
            calibrator: Calibrator::new(),
            last_calibration: None,
            baseline: None,
            alert: AlertEscalator::new(),
            shift: ShiftGate::new(),
            stats: SessionStats::new(),
            status: StatusLine::Ready,
            last_rejection: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    pub fn alert_level(&self) -> AlertLevel {
        self.alert.level()
    }

    pub fn shift(&self) -> &ShiftGate {
        &self.shift
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Begins the session. Returns `false` if a session is already running.
    pub fn start(&mut self, now: i64) -> bool {
        if self.phase != SessionPhase::NotStarted {
            return false;
        }
        tracing::info!("Attention session started");
        self.enter_calibration(now);
        true
    }

    /// Discards the baseline and calibrates again. Statistics totals survive.
    pub fn recalibrate(&mut self, now: i64) {
        tracing::info!("Recalibration requested");
        self.enter_calibration(now);
    }

    /// Discards every piece of session state, statistics included.
    pub fn new_session(&mut self, now: i64) {
        tracing::info!("New attention session");
        self.stats.reset();
        self.shift.reset();
        self.last_rejection = None;
        self.enter_calibration(now);
    }

    fn enter_calibration(&mut self, now: i64) {
        if let Some(transition) = self.alert.reset() {
            self.emit_alert_transition(now, transition);
        }
        self.calibrator.reset();
        self.last_calibration = None;
        self.baseline = None;
        self.stats.detach_clock();
        self.phase = SessionPhase::Calibrating;
        self.status = StatusLine::Calibrating;
        self.emit(Event::new(now, EventKind::CalibrationStart));
    }

    pub fn process_frame(&mut self, frame: &FrameSignal, now: i64) -> FrameOutcome {
        if self.phase == SessionPhase::NotStarted {
            return FrameOutcome::Ignored;
        }

        let face = frame.primary_face();
        self.shift.observe(face.and_then(|f| f.tracking_id));
        self.alert.arm_if_unset(now);

        match (self.phase, self.baseline) {
            (SessionPhase::Monitoring, Some(baseline)) => self.classify(face, &baseline, now),
            (phase, baseline) => {
                debug_assert!(
                    phase == SessionPhase::Calibrating && baseline.is_none(),
                    "monitoring without a baseline"
                );
                self.calibrate(face, now)
            }
        }
    }

    fn calibrate(&mut self, face: Option<&FaceSignal>, now: i64) -> FrameOutcome {
        let step = self
            .calibrator
            .observe(face, now, &self.config.calibration);
        self.last_calibration = Some(step);

        let CalibrationStep::Complete(baseline) = step else {
            return FrameOutcome::Calibrating { step };
        };

        tracing::info!(
            yaw = baseline.yaw,
            pitch = baseline.pitch,
            eye_ratio = ?baseline.eye_ratio,
            samples = self.calibrator.sample_count(),
            "Calibration complete"
        );

        self.baseline = Some(baseline);
        self.phase = SessionPhase::Monitoring;
        self.status = StatusLine::CalibrationComplete;
        self.alert.arm(now);
        // 统计保持未播种，由第一帧真实判定决定初始状态
        self.shift.start(now);
        self.last_rejection = None;
        self.emit(Event::new(now, EventKind::CalibrationComplete));

        FrameOutcome::Calibrated { baseline }
    }

    fn classify(
        &mut self,
        face: Option<&FaceSignal>,
        baseline: &Baseline,
        now: i64,
    ) -> FrameOutcome {
        let away_reason = classifier::away_reason(face, baseline, &self.config.classifier);
        let gaze = if away_reason.is_some() {
            Gaze::Away
        } else {
            Gaze::Looking
        };

        let alert = match gaze {
            Gaze::Looking => self.alert.on_looking(now),
            Gaze::Away => self.alert.on_away(now, &self.config.alert),
        };

        tracing::debug!(
            yaw = face.map(|f| f.yaw),
            pitch = face.map(|f| f.pitch),
            gaze = ?gaze,
            reason = ?away_reason,
            away_for_ms = alert.away_for_ms,
            "Frame classified"
        );

        if let Some(transition) = alert.transition {
            self.emit_alert_transition(now, transition);
        }

        match self.stats.update(now, gaze.is_looking()) {
            Some(StatsTransition::LookAwayStarted) => {
                self.emit(Event::new(now, EventKind::LookAwayStart));
            }
            Some(StatsTransition::LookAwayEnded { duration_ms }) => {
                self.emit(Event::look_away_end(now, duration_ms));
            }
            None => {}
        }

        self.status = match gaze {
            Gaze::Looking => StatusLine::Looking,
            Gaze::Away => StatusLine::LookAway,
        };

        FrameOutcome::Classified {
            gaze,
            away_reason,
            alert,
        }
    }

    fn emit_alert_transition(&self, now: i64, transition: AlertTransition) {
        match transition {
            AlertTransition::Started(level) => {
                tracing::info!(level = level.as_str(), "Attention alert started");
                self.emit(Event::alert_start(now, level));
            }
            AlertTransition::Stopped => {
                tracing::info!("Attention alert stopped");
                self.emit(Event::new(now, EventKind::AlertStop));
            }
        }
    }

    /// Wall-clock driven; independent of frame arrival.
    pub fn tick_shift(&mut self, now: i64) -> ShiftUpdate {
        let tick = self.shift.tick(now, &self.config.shift);
        let tone = match tick {
            ShiftTick::Expired { pending } => {
                tracing::warn!(pending_tracking_id = ?pending, "Shift expired, operator rotation required");
                self.last_rejection = None;
                self.emit(Event::new(now, EventKind::ShiftAlert));
                Some(ToneRequest {
                    kind: ToneKind::ShiftAlert,
                    duration_ms: self.config.shift.alert_tone_ms,
                })
            }
            _ => None,
        };
        ShiftUpdate { tick, tone }
    }

    /// Acknowledges the rotation with the tracking id of the latest frame.
    pub fn acknowledge_shift(&mut self, now: i64) -> Result<(), AckRejection> {
        let current = self.shift.current();
        self.acknowledge_shift_with(current, now)
    }

    pub fn acknowledge_shift_with(
        &mut self,
        current: Option<TrackingId>,
        now: i64,
    ) -> Result<(), AckRejection> {
        match self.shift.acknowledge(current, now) {
            Ok(()) => {
                tracing::info!(tracking_id = ?current, "Shift rotation acknowledged");
                self.last_rejection = None;
                self.emit(Event::new(now, EventKind::ShiftAck));
                Ok(())
            }
            Err(AckRejection::NotPending) => Err(AckRejection::NotPending),
            Err(rejection) => {
                if let AckRejection::SameOperator { tracking_id } = rejection {
                    tracing::warn!(%tracking_id, "Shift acknowledgment by the same operator");
                    self.emit(Event::same_operator(now, tracking_id));
                } else {
                    tracing::info!("Shift acknowledgment without a tracked face");
                }
                self.last_rejection = Some(rejection);
                Err(rejection)
            }
        }
    }

    pub fn snapshot(&self, now: i64) -> SessionView {
        let shift_remaining_ms = self.shift.remaining_ms(now, &self.config.shift);
        let stats = self.stats.summary(now);
        let awaiting_rotation = self.shift.is_awaiting_rotation();
        let calibration = match self.phase {
            SessionPhase::Calibrating => self.last_calibration,
            _ => None,
        };

        SessionView {
            phase: self.phase,
            status: self.status.as_str(),
            calibration,
            calibration_prompt: calibration.as_ref().map(view::calibration_prompt),
            alert_level: self.alert.level(),
            visual: VisualAlert::for_level(self.alert.level(), &self.config.alert),
            shift_remaining_secs: shift_remaining_ms.map(|ms| ms / 1000),
            shift_label: view::shift_label(
                shift_remaining_ms.unwrap_or(self.config.shift.duration_ms),
            ),
            awaiting_rotation,
            rotation_prompt: awaiting_rotation.then(|| {
                self.last_rejection
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| ROTATION_PROMPT.to_string())
            }),
            tracking_id: self.shift.current(),
            stats,
            stats_text: view::stats_text(&stats),
        }
    }

    fn emit(&self, event: Event) {
        self.sink.emit(event);
    }
}
