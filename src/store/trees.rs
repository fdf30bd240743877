pub const LOG_EVENTS: &str = "log_events";
