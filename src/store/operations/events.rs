use serde::{Deserialize, Serialize};

use crate::engine::events::Event;
use crate::store::keys;
use crate::store::{Store, StoreError};

/// 持久化后的事件日志记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: u64,
    pub timestamp_ms: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub message: Option<String>,
    pub duration_ms: Option<i64>,
}

impl Store {
    pub fn append_event(&self, event: &Event) -> Result<LogRecord, StoreError> {
        let id = self.raw_db().generate_id()?;
        let record = LogRecord {
            id,
            timestamp_ms: event.timestamp_ms,
            event_type: event.kind.as_str().to_string(),
            message: event.message.clone(),
            duration_ms: event.duration_ms,
        };

        let key = keys::log_event_key(record.timestamp_ms, id);
        self.log_events
            .insert(key.as_bytes(), Self::serialize(&record)?)?;
        Ok(record)
    }

    pub fn recent_events(&self, limit: usize) -> Result<Vec<LogRecord>, StoreError> {
        let mut records = Vec::with_capacity(limit.min(256));
        if limit == 0 {
            return Ok(records);
        }
        for item in self.log_events.iter() {
            let (_, raw) = item?;
            records.push(Self::deserialize(&raw)?);
            if records.len() >= limit {
                break;
            }
        }
        Ok(records)
    }

    pub fn count_events(&self) -> usize {
        self.log_events.len()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::engine::events::EventKind;
    use crate::engine::types::AlertLevel;

    fn open_store(dir: &tempfile::TempDir) -> Store {
        let db_path = dir.path().join("events-db");
        Store::open(db_path.to_str().unwrap()).unwrap()
    }

    #[test]
    fn recent_events_are_newest_first() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        store
            .append_event(&Event::new(1_000, EventKind::CalibrationStart))
            .unwrap();
        store
            .append_event(&Event::alert_start(9_000, AlertLevel::Soft))
            .unwrap();
        store
            .append_event(&Event::look_away_end(5_000, 2_500))
            .unwrap();

        let list = store.recent_events(10).unwrap();
        let types: Vec<_> = list.iter().map(|r| r.event_type.as_str()).collect();
        assert_eq!(types, vec!["ALERT_START", "LOOK_AWAY_END", "CALIBRATION_START"]);
        assert_eq!(list[0].message.as_deref(), Some("soft"));
        assert_eq!(list[1].duration_ms, Some(2_500));
        assert_eq!(store.count_events(), 3);
    }

    #[test]
    fn same_millisecond_prefers_latest_insert() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let first = store
            .append_event(&Event::new(1_000, EventKind::LookAwayStart))
            .unwrap();
        let second = store
            .append_event(&Event::new(1_000, EventKind::AlertStop))
            .unwrap();
        assert!(second.id > first.id);

        let list = store.recent_events(1).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].event_type, "ALERT_STOP");
        assert!(store.recent_events(0).unwrap().is_empty());
    }

    #[test]
    fn record_json_uses_log_field_names() {
        let record = LogRecord {
            id: 7,
            timestamp_ms: 42,
            event_type: "SHIFT_ACK".to_string(),
            message: None,
            duration_ms: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "SHIFT_ACK");
        assert_eq!(json["timestampMs"], 42);
        assert!(json.get("eventType").is_none());
    }
}
