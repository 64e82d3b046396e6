use crate::error::AppError;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(local_offset())
}

pub fn today() -> Date {
    local_now().date()
}

pub fn now_timestamp() -> PrimitiveDateTime {
    let now = local_now();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> Result<String, AppError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Formats a completion timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(value: PrimitiveDateTime) -> Result<String, AppError> {
    value
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(
        raw.trim(),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .ok()
}
