use serde::Serialize;

use crate::engine::config::ClassifierConfig;
use crate::engine::types::{Baseline, FaceSignal, Gaze};

/// 判定为离开的原因，仅用于诊断日志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AwayReason {
    NoFace,
    HeadTurned,
    EyesDown,
    EyesClosed,
}

pub fn classify(face: Option<&FaceSignal>, baseline: &Baseline, config: &ClassifierConfig) -> Gaze {
    match away_reason(face, baseline, config) {
        Some(_) => Gaze::Away,
        None => Gaze::Looking,
    }
}

/// `None` means the face is looking at the screen.
pub fn away_reason(
    face: Option<&FaceSignal>,
    baseline: &Baseline,
    config: &ClassifierConfig,
) -> Option<AwayReason> {
    let Some(face) = face else {
        return Some(AwayReason::NoFace);
    };

    let head_aligned = (face.yaw - baseline.yaw).abs() <= config.max_yaw_deviation
        && (face.pitch - baseline.pitch).abs() <= config.max_pitch_deviation;
    if !head_aligned {
        return Some(AwayReason::HeadTurned);
    }

    if eyes_down(face, baseline, config) {
        return Some(AwayReason::EyesDown);
    }

    if eyes_closed(face, config) {
        return Some(AwayReason::EyesClosed);
    }

    None
}

fn eyes_down(face: &FaceSignal, baseline: &Baseline, config: &ClassifierConfig) -> bool {
    match (baseline.eye_ratio, face.eye_ratio()) {
        (Some(base), Some(current)) => current - base >= config.eye_down_ratio_threshold,
        _ => false,
    }
}

// 任一眼睁开概率缺失时跳过，缺失数据不能把人判为离开
fn eyes_closed(face: &FaceSignal, config: &ClassifierConfig) -> bool {
    match (face.left_eye_open, face.right_eye_open) {
        (Some(left), Some(right)) => {
            left < config.eye_closed_probability && right < config.eye_closed_probability
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> Baseline {
        Baseline {
            yaw: 5.0,
            pitch: -3.0,
            eye_ratio: Some(0.40),
        }
    }

    fn cfg() -> ClassifierConfig {
        ClassifierConfig::default()
    }

    #[test]
    fn missing_face_is_away() {
        assert_eq!(classify(None, &baseline(), &cfg()), Gaze::Away);
        assert_eq!(away_reason(None, &baseline(), &cfg()), Some(AwayReason::NoFace));
    }

    #[test]
    fn deviation_boundary_is_inclusive() {
        let face = FaceSignal::new(25.0, 17.0);
        assert_eq!(classify(Some(&face), &baseline(), &cfg()), Gaze::Looking);

        let face = FaceSignal::new(25.1, -3.0);
        assert_eq!(
            away_reason(Some(&face), &baseline(), &cfg()),
            Some(AwayReason::HeadTurned)
        );

        let face = FaceSignal::new(5.0, -23.5);
        assert_eq!(classify(Some(&face), &baseline(), &cfg()), Gaze::Away);
    }

    #[test]
    fn eyes_below_baseline_count_as_looking_down() {
        let face = FaceSignal::new(5.0, -3.0).with_eye_ratio(0.45);
        assert_eq!(
            away_reason(Some(&face), &baseline(), &cfg()),
            Some(AwayReason::EyesDown)
        );

        let face = FaceSignal::new(5.0, -3.0).with_eye_ratio(0.43);
        assert_eq!(classify(Some(&face), &baseline(), &cfg()), Gaze::Looking);
    }

    #[test]
    fn eye_ratio_check_disabled_without_baseline_ratio() {
        let base = Baseline {
            eye_ratio: None,
            ..baseline()
        };
        let face = FaceSignal::new(5.0, -3.0).with_eye_ratio(0.9);
        assert_eq!(classify(Some(&face), &base, &cfg()), Gaze::Looking);
    }

    #[test]
    fn closed_requires_both_probabilities() {
        let closed = FaceSignal::new(5.0, -3.0).with_eyes_open(0.1, 0.2);
        assert_eq!(
            away_reason(Some(&closed), &baseline(), &cfg()),
            Some(AwayReason::EyesClosed)
        );

        let one_open = FaceSignal::new(5.0, -3.0).with_eyes_open(0.1, 0.9);
        assert_eq!(classify(Some(&one_open), &baseline(), &cfg()), Gaze::Looking);

        let mut half_known = FaceSignal::new(5.0, -3.0);
        half_known.left_eye_open = Some(0.0);
        assert_eq!(classify(Some(&half_known), &baseline(), &cfg()), Gaze::Looking);
    }
}
