//! 基线校准
//!
//! 在固定窗口内累积 yaw / pitch 与眼位比例，窗口结束且样本足够后给出基线。
//! 眼位样本不足时基线不含眼位，本次会话关闭低头检测。

use serde::Serialize;

use crate::engine::config::CalibrationConfig;
use crate::engine::types::{Baseline, FaceSignal};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum CalibrationStep {
    /// 画面中没有人脸，不计时也不累积
    Waiting,
    Collecting { remaining_secs: i64, samples: u32 },
    Complete(Baseline),
}

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    started_at: Option<i64>,
    sample_count: u32,
    yaw_sum: f64,
    pitch_sum: f64,
    eye_ratio_sum: f64,
    eye_ratio_samples: u32,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn started_at(&self) -> Option<i64> {
        self.started_at
    }

    /// Feeds one frame. Once `Complete` is returned the caller stops routing
    /// frames here until `reset`.
    pub fn observe(
        &mut self,
        face: Option<&FaceSignal>,
        now: i64,
        config: &CalibrationConfig,
    ) -> CalibrationStep {
        let Some(face) = face else {
            return CalibrationStep::Waiting;
        };

        let started_at = *self.started_at.get_or_insert(now);

        self.yaw_sum += face.yaw;
        self.pitch_sum += face.pitch;
        self.sample_count += 1;
        if let Some(ratio) = face.eye_ratio() {
            self.eye_ratio_sum += ratio;
            self.eye_ratio_samples += 1;
        }

        let elapsed = now - started_at;
        if elapsed >= config.window_ms && self.sample_count >= config.min_samples {
            return CalibrationStep::Complete(self.baseline(config));
        }

        let remaining_secs = (config.window_ms - elapsed).max(0) / 1000 + 1;
        CalibrationStep::Collecting {
            remaining_secs,
            samples: self.sample_count,
        }
    }

    fn baseline(&self, config: &CalibrationConfig) -> Baseline {
        let n = f64::from(self.sample_count);
        let eye_ratio = if self.eye_ratio_samples >= config.min_eye_samples {
            Some(self.eye_ratio_sum / f64::from(self.eye_ratio_samples))
        } else {
            None
        };
        Baseline {
            yaw: self.yaw_sum / n,
            pitch: self.pitch_sum / n,
            eye_ratio,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(calibrator: &mut Calibrator, faces: &[FaceSignal], step_ms: i64) -> CalibrationStep {
        let cfg = CalibrationConfig::default();
        let mut last = CalibrationStep::Waiting;
        for (i, face) in faces.iter().enumerate() {
            last = calibrator.observe(Some(face), i as i64 * step_ms, &cfg);
        }
        last
    }

    #[test]
    fn absent_face_does_not_start_clock() {
        let mut c = Calibrator::new();
        let cfg = CalibrationConfig::default();
        assert_eq!(c.observe(None, 1_000, &cfg), CalibrationStep::Waiting);
        assert_eq!(c.started_at(), None);
        assert_eq!(c.sample_count(), 0);
    }

    #[test]
    fn completes_with_mean_pose() {
        let mut c = Calibrator::new();
        let faces: Vec<FaceSignal> = (0..21)
            .map(|i| FaceSignal::new(if i % 2 == 0 { 4.0 } else { 2.0 }, -1.0))
            .collect();
        // 21 帧 × 250ms，最后一帧在 5000ms
        let step = run(&mut c, &faces, 250);
        let CalibrationStep::Complete(baseline) = step else {
            panic!("expected completion, got {step:?}");
        };
        let expected_yaw = (11.0 * 4.0 + 10.0 * 2.0) / 21.0;
        assert!((baseline.yaw - expected_yaw).abs() < 1e-9);
        assert!((baseline.pitch + 1.0).abs() < 1e-9);
        assert_eq!(baseline.eye_ratio, None);
    }

    #[test]
    fn window_elapsed_but_too_few_samples_keeps_collecting() {
        let mut c = Calibrator::new();
        let faces = vec![FaceSignal::new(0.0, 0.0); 5];
        let step = run(&mut c, &faces, 2_000);
        assert!(matches!(step, CalibrationStep::Collecting { samples: 5, .. }));
    }

    #[test]
    fn enough_samples_but_window_open_keeps_collecting() {
        let mut c = Calibrator::new();
        let faces = vec![FaceSignal::new(0.0, 0.0); 40];
        let step = run(&mut c, &faces, 10);
        assert_eq!(
            step,
            CalibrationStep::Collecting {
                remaining_secs: 5,
                samples: 40
            }
        );
    }

    #[test]
    fn eye_ratio_requires_its_own_minimum() {
        let mut c = Calibrator::new();
        let mut faces = vec![FaceSignal::new(0.0, 0.0); 20];
        for face in faces.iter_mut().take(12) {
            face.eye_center_ratio = Some(0.4);
        }
        faces.push(FaceSignal::new(0.0, 0.0));
        let CalibrationStep::Complete(baseline) = run(&mut c, &faces, 250) else {
            panic!("expected completion");
        };
        assert!((baseline.eye_ratio.unwrap() - 0.4).abs() < 1e-9);

        let mut c = Calibrator::new();
        let mut faces = vec![FaceSignal::new(0.0, 0.0); 21];
        for face in faces.iter_mut().take(9) {
            face.eye_center_ratio = Some(0.4);
        }
        let CalibrationStep::Complete(baseline) = run(&mut c, &faces, 250) else {
            panic!("expected completion");
        };
        assert_eq!(baseline.eye_ratio, None);
    }

    #[test]
    fn reset_clears_accumulator() {
        let mut c = Calibrator::new();
        run(&mut c, &[FaceSignal::new(10.0, 10.0)], 100);
        c.reset();
        assert_eq!(c.sample_count(), 0);
        assert_eq!(c.started_at(), None);
    }
}
