use chrono::{DateTime, Local, Utc};
use uuid::Uuid;

pub fn current_timestamp() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

/// 把 Unix 秒数格式化成本地时间，0 表示从未记录
pub fn format_timestamp(secs: u64) -> String {
    if secs == 0 {
        return "-".to_string();
    }
    match DateTime::from_timestamp(secs as i64, 0) {
        Some(t) => t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// 生成一个随机唯一 ID
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}
