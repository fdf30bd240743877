//! 两级告警升级状态机
//!
//! 由持续离开时长驱动：`away_for_ms = now - last_looking_at`。
//! - < soft_after_ms：不告警（短暂离开直接去抖）
//! - [soft_after_ms, strong_after_ms)：Soft
//! - >= strong_after_ms：Strong
//!
//! 视觉效果只在等级变化时触发；提示音另有独立冷却，活跃期间每帧都会检查。

use serde::Serialize;

use crate::engine::config::{AlertConfig, AlertLevelProfile};
use crate::engine::types::{AlertLevel, ToneKind, ToneRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "level")]
pub enum AlertTransition {
    Started(AlertLevel),
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseEffect {
    pub max_alpha: f64,
    pub period_ms: u32,
}

/// 提供给渲染方的视觉告警状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualAlert {
    pub pulse: Option<PulseEffect>,
    pub shake: bool,
    pub warning: Option<&'static str>,
}

impl VisualAlert {
    pub const NONE: VisualAlert = VisualAlert {
        pulse: None,
        shake: false,
        warning: None,
    };

    pub fn for_level(level: AlertLevel, config: &AlertConfig) -> Self {
        match level {
            AlertLevel::Inactive => Self::NONE,
            AlertLevel::Soft => Self {
                pulse: Some(pulse(&config.soft)),
                shake: false,
                warning: Some("Eyes on screen"),
            },
            AlertLevel::Strong => Self {
                pulse: Some(pulse(&config.strong)),
                shake: true,
                warning: Some("LOOK AT SCREEN"),
            },
        }
    }
}

fn pulse(profile: &AlertLevelProfile) -> PulseEffect {
    PulseEffect {
        max_alpha: profile.pulse_max_alpha,
        period_ms: profile.pulse_period_ms,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertUpdate {
    pub level: AlertLevel,
    pub away_for_ms: i64,
    pub transition: Option<AlertTransition>,
    pub tone: Option<ToneRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct AlertEscalator {
    level: AlertLevel,
    last_looking_at: Option<i64>,
    last_tone_at: Option<i64>,
}

impl AlertEscalator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> AlertLevel {
        self.level
    }

    pub fn last_looking_at(&self) -> Option<i64> {
        self.last_looking_at
    }

    pub fn last_tone_at(&self) -> Option<i64> {
        self.last_tone_at
    }

    /// Starts the away clock; used when monitoring begins.
    pub fn arm(&mut self, now: i64) {
        self.last_looking_at = Some(now);
    }

    /// Seeds the away clock only if nothing has set it yet.
    pub fn arm_if_unset(&mut self, now: i64) {
        self.last_looking_at.get_or_insert(now);
    }

    pub fn on_looking(&mut self, now: i64) -> AlertUpdate {
        self.last_looking_at = Some(now);
        AlertUpdate {
            level: AlertLevel::Inactive,
            away_for_ms: 0,
            transition: self.silence(),
            tone: None,
        }
    }

    pub fn on_away(&mut self, now: i64, config: &AlertConfig) -> AlertUpdate {
        let since = *self.last_looking_at.get_or_insert(now);
        let away_for_ms = (now - since).max(0);

        let target = if away_for_ms >= config.strong_after_ms {
            AlertLevel::Strong
        } else if away_for_ms >= config.soft_after_ms {
            AlertLevel::Soft
        } else {
            AlertLevel::Inactive
        };

        let transition = if target == self.level {
            None
        } else if target.is_active() {
            self.level = target;
            Some(AlertTransition::Started(target))
        } else {
            self.silence()
        };

        let tone = match target {
            AlertLevel::Inactive => None,
            AlertLevel::Soft => self.maybe_tone(now, &config.soft),
            AlertLevel::Strong => self.maybe_tone(now, &config.strong),
        };

        AlertUpdate {
            level: self.level,
            away_for_ms,
            transition,
            tone,
        }
    }

    /// Drops to `Inactive` immediately; no cooldown applies to stopping.
    pub fn silence(&mut self) -> Option<AlertTransition> {
        if !self.level.is_active() {
            return None;
        }
        self.level = AlertLevel::Inactive;
        Some(AlertTransition::Stopped)
    }

    fn maybe_tone(&mut self, now: i64, profile: &AlertLevelProfile) -> Option<ToneRequest> {
        if let Some(last) = self.last_tone_at {
            if now - last < profile.tone_cooldown_ms {
                return None;
            }
        }
        self.last_tone_at = Some(now);
        Some(ToneRequest {
            kind: ToneKind::Attention,
            duration_ms: profile.tone_duration_ms,
        })
    }

    pub fn reset(&mut self) -> Option<AlertTransition> {
        let transition = self.silence();
        self.last_looking_at = None;
        self.last_tone_at = None;
        transition
    }
}
