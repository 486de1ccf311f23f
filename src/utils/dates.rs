use chrono::{Local, NaiveDate};

use crate::error::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's calendar date in the device's local timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn today_string() -> String {
    format_date(today())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("无效的日期格式: {value}")))
}
