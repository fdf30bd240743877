/// 校准窗口默认时长（毫秒）
pub const DEFAULT_CALIBRATION_WINDOW_MS: i64 = 5_000;

/// 较长的校准窗口（毫秒），供需要更稳定基线的宿主使用
pub const EXTENDED_CALIBRATION_WINDOW_MS: i64 = 10_000;

/// 完成校准所需的最少人脸样本数
pub const MIN_CALIBRATION_SAMPLES: u32 = 20;

/// 启用眼位偏移检测所需的最少眼位样本数
pub const MIN_EYE_CALIBRATION_SAMPLES: u32 = 10;

/// 头部 yaw / pitch 允许偏离基线的最大角度（度）
pub const MAX_HEAD_DEVIATION_DEG: f64 = 20.0;

/// 眼位相对基线下移超过此比例即视为低头看
pub const EYE_DOWN_RATIO_THRESHOLD: f64 = 0.04;

/// 双眼睁开概率均低于此值即视为闭眼
pub const EYE_CLOSED_PROBABILITY: f64 = 0.4;

/// 持续离开超过此时长进入轻度告警（毫秒）
pub const SOFT_ALERT_AFTER_MS: i64 = 2_000;

/// 持续离开超过此时长进入强告警（毫秒）
pub const STRONG_ALERT_AFTER_MS: i64 = 5_000;

/// 参考会话中的换班时长（毫秒），生产环境应配置得更长
pub const DEFAULT_SHIFT_DURATION_MS: i64 = 10_000;

/// 换班提醒音时长（毫秒）
pub const SHIFT_ALERT_TONE_MS: u32 = 500;

/// 换班倒计时刷新周期
pub const SHIFT_TICK_INTERVAL_SECS: u64 = 1;

/// 日志查看默认返回的最近记录数
pub const DEFAULT_RECENT_LOG_LIMIT: usize = 200;
