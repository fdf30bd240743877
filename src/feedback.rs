//! 渲染与音频的协作者接口
//!
//! 引擎只给出"播放提示音"和"当前视图"两类副作用，宿主决定怎么呈现。

use std::sync::Mutex;

use crate::engine::types::{ToneKind, ToneRequest};
use crate::engine::view::SessionView;

pub trait Feedback: Send + Sync {
    fn play_tone(&self, tone: ToneRequest);
    fn present(&self, view: &SessionView);
}

/// Writes every side effect to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn play_tone(&self, tone: ToneRequest) {
        match tone.kind {
            ToneKind::Attention => {
                tracing::info!(duration_ms = tone.duration_ms, "Attention tone")
            }
            ToneKind::ShiftAlert => {
                tracing::info!(duration_ms = tone.duration_ms, "Shift alert tone")
            }
        }
    }

    fn present(&self, view: &SessionView) {
        tracing::trace!(
            status = view.status,
            alert = view.alert_level.as_str(),
            shift = %view.shift_label,
            awaiting_rotation = view.awaiting_rotation,
            "Session view"
        );
    }
}

/// Keeps tones and views for inspection.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    tones: Mutex<Vec<ToneRequest>>,
    views: Mutex<Vec<SessionView>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tones(&self) -> Vec<ToneRequest> {
        self.tones
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_view(&self) -> Option<SessionView> {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .last()
            .cloned()
    }

    pub fn view_count(&self) -> usize {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Feedback for RecordingFeedback {
    fn play_tone(&self, tone: ToneRequest) {
        self.tones
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tone);
    }

    fn present(&self, view: &SessionView) {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(view.clone());
    }
}
