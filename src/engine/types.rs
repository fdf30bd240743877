use std::fmt;

use serde::{Deserialize, Serialize};

/// 检测器在连续帧之间为同一张脸分配的短期标识，仅作为"是否同一人"的近似
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(pub i64);

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeLandmarks {
    pub left_eye: Point,
    pub right_eye: Point,
}

/// 单张人脸的检测信号
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceSignal {
    /// 偏航角（度）
    pub yaw: f64,
    /// 俯仰角（度）
    pub pitch: f64,
    #[serde(default)]
    pub left_eye_open: Option<f64>,
    #[serde(default)]
    pub right_eye_open: Option<f64>,
    /// 双眼中心纵坐标相对人脸框高度的位置
    #[serde(default)]
    pub eye_center_ratio: Option<f64>,
    #[serde(default)]
    pub landmarks: Option<EyeLandmarks>,
    #[serde(default)]
    pub tracking_id: Option<TrackingId>,
    #[serde(default)]
    pub bounding_box: BoundingBox,
}

impl FaceSignal {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self {
            yaw,
            pitch,
            ..Self::default()
        }
    }

    pub fn with_tracking_id(mut self, id: i64) -> Self {
        self.tracking_id = Some(TrackingId(id));
        self
    }

    pub fn with_eye_ratio(mut self, ratio: f64) -> Self {
        self.eye_center_ratio = Some(ratio);
        self
    }

    pub fn with_eyes_open(mut self, left: f64, right: f64) -> Self {
        self.left_eye_open = Some(left);
        self.right_eye_open = Some(right);
        self
    }

    /// Explicit ratio when the detector supplies one, otherwise derived from
    /// the eye landmarks and the face box.
    pub fn eye_ratio(&self) -> Option<f64> {
        if let Some(ratio) = self.eye_center_ratio {
            return Some(ratio);
        }
        let landmarks = self.landmarks?;
        let height = self.bounding_box.height();
        if height <= 0.0 {
            return None;
        }
        let eye_center_y = (landmarks.left_eye.y + landmarks.right_eye.y) / 2.0;
        Some((eye_center_y - self.bounding_box.top) / height)
    }
}

/// 一帧检测结果；帧尺寸与旋转角只供渲染方使用
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSignal {
    #[serde(default)]
    pub faces: Vec<FaceSignal>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub rotation_degrees: i32,
}

impl FrameSignal {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_face(face: FaceSignal) -> Self {
        Self {
            faces: vec![face],
            ..Self::default()
        }
    }

    /// 多张脸时只取第一张，属于单主体范围的策略而非识别
    pub fn primary_face(&self) -> Option<&FaceSignal> {
        self.faces.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub yaw: f64,
    pub pitch: f64,
    pub eye_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gaze {
    Looking,
    Away,
}

impl Gaze {
    pub fn is_looking(self) -> bool {
        matches!(self, Gaze::Looking)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    Inactive,
    Soft,
    Strong,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Soft => "soft",
            Self::Strong => "strong",
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToneKind {
    /// 注意力告警提示音
    Attention,
    /// 换班提醒音，与注意力告警区分
    ShiftAlert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneRequest {
    pub kind: ToneKind,
    pub duration_ms: u32,
}
