use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    pub window_ms: i64,
    pub min_samples: u32,
    /// 眼位信号不总是可用，因此单独设置门槛
    pub min_eye_samples: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_CALIBRATION_WINDOW_MS,
            min_samples: MIN_CALIBRATION_SAMPLES,
            min_eye_samples: MIN_EYE_CALIBRATION_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    pub max_yaw_deviation: f64,
    pub max_pitch_deviation: f64,
    pub eye_down_ratio_threshold: f64,
    pub eye_closed_probability: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_yaw_deviation: MAX_HEAD_DEVIATION_DEG,
            max_pitch_deviation: MAX_HEAD_DEVIATION_DEG,
            eye_down_ratio_threshold: EYE_DOWN_RATIO_THRESHOLD,
            eye_closed_probability: EYE_CLOSED_PROBABILITY,
        }
    }
}

/// 单个告警等级的提示音与闪烁参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertLevelProfile {
    pub tone_cooldown_ms: i64,
    pub tone_duration_ms: u32,
    pub pulse_max_alpha: f64,
    pub pulse_period_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfig {
    pub soft_after_ms: i64,
    pub strong_after_ms: i64,
    pub soft: AlertLevelProfile,
    pub strong: AlertLevelProfile,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            soft_after_ms: SOFT_ALERT_AFTER_MS,
            strong_after_ms: STRONG_ALERT_AFTER_MS,
            soft: AlertLevelProfile {
                tone_cooldown_ms: 2_500,
                tone_duration_ms: 200,
                pulse_max_alpha: 0.7,
                pulse_period_ms: 700,
            },
            strong: AlertLevelProfile {
                tone_cooldown_ms: 1_500,
                tone_duration_ms: 350,
                pulse_max_alpha: 1.0,
                pulse_period_ms: 350,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftConfig {
    pub duration_ms: i64,
    pub alert_tone_ms: u32,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_SHIFT_DURATION_MS,
            alert_tone_ms: SHIFT_ALERT_TONE_MS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub shift: ShiftConfig,
}

impl EngineConfig {
    pub fn from_env(env_config: &crate::config::EngineEnvConfig) -> Self {
        let mut config = Self::default();
        config.calibration.window_ms = env_config.calibration_window_ms;
        config.shift.duration_ms = env_config.shift_duration_secs.saturating_mul(1000);
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.calibration.window_ms <= 0 {
            return Err("calibration.window_ms must be > 0".to_string());
        }
        if self.calibration.min_samples == 0 {
            return Err("calibration.min_samples must be >= 1".to_string());
        }
        if self.calibration.min_eye_samples == 0 {
            return Err("calibration.min_eye_samples must be >= 1".to_string());
        }

        if self.classifier.max_yaw_deviation <= 0.0 || self.classifier.max_pitch_deviation <= 0.0 {
            return Err("classifier head deviation limits must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.classifier.eye_closed_probability) {
            return Err("classifier.eye_closed_probability must be in [0,1]".to_string());
        }
        if self.classifier.eye_down_ratio_threshold <= 0.0 {
            return Err("classifier.eye_down_ratio_threshold must be > 0".to_string());
        }

        if self.alert.soft_after_ms < 0 {
            return Err("alert.soft_after_ms must be >= 0".to_string());
        }
        if self.alert.strong_after_ms <= self.alert.soft_after_ms {
            return Err(format!(
                "alert.strong_after_ms ({}) must exceed alert.soft_after_ms ({})",
                self.alert.strong_after_ms, self.alert.soft_after_ms
            ));
        }
        for (name, profile) in [("soft", &self.alert.soft), ("strong", &self.alert.strong)] {
            if profile.tone_cooldown_ms < 0 {
                return Err(format!("alert.{name}.tone_cooldown_ms must be >= 0"));
            }
            if !(0.0..=1.0).contains(&profile.pulse_max_alpha) {
                return Err(format!("alert.{name}.pulse_max_alpha must be in [0,1]"));
            }
        }

        if self.shift.duration_ms <= 0 {
            return Err("shift.duration_ms must be > 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn inverted_alert_thresholds_are_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.alert.strong_after_ms = cfg.alert.soft_after_ms;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.classifier.eye_closed_probability = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overlay_converts_shift_seconds() {
        let env = crate::config::EngineEnvConfig {
            calibration_window_ms: EXTENDED_CALIBRATION_WINDOW_MS,
            shift_duration_secs: 1800,
        };
        let cfg = EngineConfig::from_env(&env);
        assert_eq!(cfg.calibration.window_ms, 10_000);
        assert_eq!(cfg.shift.duration_ms, 1_800_000);
        assert_eq!(cfg.calibration.min_samples, 20);
    }
}
