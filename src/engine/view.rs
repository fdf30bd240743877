use serde::Serialize;

use crate::engine::alert::VisualAlert;
use crate::engine::calibration::CalibrationStep;
use crate::engine::stats::StatsSummary;
use crate::engine::types::{AlertLevel, TrackingId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    NotStarted,
    Calibrating,
    Monitoring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusLine {
    Ready,
    Calibrating,
    CalibrationComplete,
    Looking,
    LookAway,
}

impl StatusLine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Tap Start when ready",
            Self::Calibrating => "Calibrating",
            Self::CalibrationComplete => "Calibration complete",
            Self::Looking => "Looking at screen",
            Self::LookAway => "Look away detected",
        }
    }
}

/// 一次加锁内构建的一致快照，供渲染方读取
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: SessionPhase,
    pub status: &'static str,
    pub calibration: Option<CalibrationStep>,
    pub calibration_prompt: Option<String>,
    pub alert_level: AlertLevel,
    pub visual: VisualAlert,
    pub shift_remaining_secs: Option<i64>,
    pub shift_label: String,
    pub awaiting_rotation: bool,
    pub rotation_prompt: Option<String>,
    pub tracking_id: Option<TrackingId>,
    pub stats: StatsSummary,
    pub stats_text: String,
}

pub fn format_mm_ss(duration_ms: i64) -> String {
    let total_seconds = duration_ms.max(0) / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn shift_label(remaining_ms: i64) -> String {
    format!("Shift {}", format_mm_ss(remaining_ms))
}

pub fn stats_text(summary: &StatsSummary) -> String {
    format!(
        "Focus {}%\nLook-aways {}\nLongest {}",
        summary.focus_percent,
        summary.look_away_count,
        format_mm_ss(summary.longest_focus_ms)
    )
}

pub fn calibration_prompt(step: &CalibrationStep) -> String {
    match step {
        CalibrationStep::Waiting => "Waiting for face...".to_string(),
        CalibrationStep::Collecting { remaining_secs, .. } => {
            format!("Calibrating... {remaining_secs} s")
        }
        CalibrationStep::Complete(_) => "Calibration complete".to_string(),
    }
}
