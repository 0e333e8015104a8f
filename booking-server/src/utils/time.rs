//! 时间工具函数 - 业务时区转换
//!
//! 所有日期/时刻字符串的解析统一在 API handler 层完成，
//! 预订核心只接收 `NaiveDate` 和"自午夜分钟数"整数。

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Minutes in a day; reservation intervals must fit inside their calendar day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时刻字符串 (HH:MM) → 自午夜分钟数
pub fn parse_hhmm(time: &str) -> AppResult<i64> {
    let parsed = chrono::NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| AppError::validation(format!("Invalid time format: {}", time)))?;
    Ok(parsed.hour() as i64 * 60 + parsed.minute() as i64)
}

/// 自午夜分钟数 → "HH:MM"
///
/// An exclusive end of exactly 24:00 renders as "24:00".
pub fn format_minute(minute: i64) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// 当前业务时区本地时间 (naive)
pub fn local_now(tz: Tz) -> NaiveDateTime {
    chrono::Utc::now().with_timezone(&tz).naive_local()
}

/// 拆分本地时间为 (日期, 自午夜分钟数)
pub fn date_and_minute(now: NaiveDateTime) -> (NaiveDate, i64) {
    let minute = now.time().hour() as i64 * 60 + now.time().minute() as i64;
    (now.date(), minute)
}
