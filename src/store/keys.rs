/// 倒序时间戳在前，正向遍历即为最新优先；同一毫秒内后写入的 id 更大，倒序后排在前面
pub fn log_event_key(timestamp_ms: i64, id: u64) -> String {
    let reverse_ts = u64::MAX - timestamp_ms.max(0) as u64;
    let reverse_id = u64::MAX - id;
    format!("{:020}:{:020}", reverse_ts, reverse_id)
}
