use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_CALIBRATION_WINDOW_MS, DEFAULT_RECENT_LOG_LIMIT, DEFAULT_SHIFT_DURATION_MS};

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub recent_log_limit: usize,
    pub worker: WorkerConfig,
    pub engine: EngineEnvConfig,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enable_log_flush: bool,
    pub log_flush_cron: String,
}

#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    pub calibration_window_ms: i64,
    pub shift_duration_secs: i64,
}

impl Default for EngineEnvConfig {
    fn default() -> Self {
        Self {
            calibration_window_ms: DEFAULT_CALIBRATION_WINDOW_MS,
            shift_duration_secs: DEFAULT_SHIFT_DURATION_MS / 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let engine_defaults = EngineEnvConfig::default();
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/screeneye.sled"),
            recent_log_limit: env_or_parse("RECENT_LOG_LIMIT", DEFAULT_RECENT_LOG_LIMIT),
            worker: WorkerConfig {
                enable_log_flush: env_or_bool("ENABLE_LOG_FLUSH_WORKER", true),
                log_flush_cron: env_or("LOG_FLUSH_CRON", "*/30 * * * * *"),
            },
            engine: EngineEnvConfig {
                calibration_window_ms: env_or_parse(
                    "CALIBRATION_WINDOW_MS",
                    engine_defaults.calibration_window_ms,
                ),
                shift_duration_secs: env_or_parse(
                    "SHIFT_DURATION_SECS",
                    engine_defaults.shift_duration_secs,
                ),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!(key, value = %raw, "Unrecognised boolean env var, using default");
                default
            }
        },
        Err(_) => default,
    }
}
