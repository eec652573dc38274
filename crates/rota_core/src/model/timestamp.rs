use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn now_timestamp() -> Result<String, AppError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Offset of the local zone, UTC when it cannot be read.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn today_local() -> Date {
    OffsetDateTime::now_utc().to_offset(local_offset()).date()
}

/// The UTC instant at which `date` begins in the zone at `offset`, in the
/// same RFC 3339 form [`now_timestamp`] writes.
pub fn start_of_day_utc(date: Date, offset: UtcOffset) -> Result<String, AppError> {
    date.midnight()
        .checked_sub(Duration::seconds(i64::from(offset.whole_seconds())))
        .ok_or_else(|| AppError::invalid_data(format!("{date} is out of range at {offset}")))?
        .assume_utc()
        .format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Calendar date of `moment` at `offset`; `None` past the representable range.
pub fn date_at_offset(moment: OffsetDateTime, offset: UtcOffset) -> Option<Date> {
    let shift = i64::from(offset.whole_seconds()) - i64::from(moment.offset().whole_seconds());
    moment
        .checked_add(Duration::seconds(shift))
        .map(|shifted| shifted.date())
}

/// Accepts RFC 3339 as well as the offset-less form a `TIMESTAMP` column
/// returns; the latter is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    let fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let whole = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(trimmed, fraction)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, whole))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| AppError::invalid_data(format!("invalid timestamp '{trimmed}'")))
}

pub fn parse_date(raw: &str) -> Result<Date, AppError> {
    let trimmed = raw.trim();
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input(format!("date '{trimmed}' must be YYYY-MM-DD")))
}

pub fn format_date(date: Date) -> Result<String, AppError> {
    date.format(format_description!("[year]-[month]-[day]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}
