//! Date and time-of-day validators shared by the allocator and the ad service.

use crate::error::{AdError, AdResult};
use crate::types::TimeSlotSpec;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// `"HH:MM"`, 24-hour clock, single-digit hours allowed.
pub fn is_valid_time(value: &str) -> bool {
    TIME_RE.is_match(value)
}

/// Validates a single slot definition. Messages name the offending field so
/// the caller can surface them verbatim.
pub fn validate_slot(slot: &TimeSlotSpec) -> AdResult<()> {
    if !is_valid_time(&slot.start_time) {
        return Err(AdError::InvalidInput(format!(
            "start_time {:?} must be HH:MM",
            slot.start_time
        )));
    }
    if !is_valid_time(&slot.end_time) {
        return Err(AdError::InvalidInput(format!(
            "end_time {:?} must be HH:MM",
            slot.end_time
        )));
    }
    if slot.start_time >= slot.end_time {
        return Err(AdError::InvalidInput(format!(
            "start_time {:?} must be before end_time {:?}",
            slot.start_time, slot.end_time
        )));
    }
    if slot.days_of_week.is_empty() {
        return Err(AdError::InvalidInput(
            "days_of_week must not be empty".into(),
        ));
    }
    if let Some(day) = slot.days_of_week.iter().find(|d| **d > 6) {
        return Err(AdError::InvalidInput(format!(
            "day_of_week {day} out of range 0-6"
        )));
    }
    if !(1..=5).contains(&slot.priority) {
        return Err(AdError::InvalidInput(format!(
            "priority {} out of range 1-5",
            slot.priority
        )));
    }
    Ok(())
}

/// Whole-batch validation: the first invalid slot rejects the entire set.
pub fn validate_slots(slots: &[TimeSlotSpec]) -> AdResult<()> {
    if slots.is_empty() {
        return Err(AdError::InvalidInput("at least one time slot required".into()));
    }
    for slot in slots {
        validate_slot(slot)?;
    }
    Ok(())
}

/// Parses a caller-supplied `"YYYY-MM-DD"` string.
pub fn parse_date_param(value: &str) -> AdResult<NaiveDate> {
    if !DATE_RE.is_match(value) {
        return Err(AdError::InvalidInput(format!(
            "date {value:?} must be YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AdError::InvalidInput(format!("date {value:?} is not a real date")))
}

/// Half-open window overlap on lexicographic `"HH:MM"` bounds.
pub fn windows_overlap(a_start: &str, a_end: &str, b_start: &str, b_end: &str) -> bool {
    a_start < b_end && b_start < a_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str, days: Vec<u8>, priority: u8) -> TimeSlotSpec {
        TimeSlotSpec {
            start_time: start.to_string(),
            end_time: end.to_string(),
            days_of_week: days,
            priority,
        }
    }

    #[test]
    fn test_time_format() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("9:30"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("noon"));
    }

    #[test]
    fn test_start_must_precede_end() {
        let err = validate_slot(&slot("10:00", "09:00", vec![1], 1)).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");

        assert!(validate_slot(&slot("09:00", "10:00", vec![1], 1)).is_ok());
    }

    #[test]
    fn test_day_out_of_range() {
        let err = validate_slot(&slot("09:00", "10:00", vec![7], 1)).unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn test_priority_bounds() {
        assert!(validate_slot(&slot("09:00", "10:00", vec![0], 0)).is_err());
        assert!(validate_slot(&slot("09:00", "10:00", vec![0], 6)).is_err());
        assert!(validate_slot(&slot("09:00", "10:00", vec![0], 1)).is_ok());
        assert!(validate_slot(&slot("09:00", "10:00", vec![0], 5)).is_ok());
    }

    #[test]
    fn test_batch_rejects_on_first_invalid() {
        let slots = vec![
            slot("09:00", "10:00", vec![1], 1),
            slot("10:00", "09:00", vec![1], 1),
        ];
        assert!(validate_slots(&slots).is_err());
        assert!(validate_slots(&[]).is_err());
    }

    #[test]
    fn test_parse_date_param() {
        assert!(parse_date_param("2025-06-15").is_ok());
        assert!(parse_date_param("2025-13-01").is_err());
        assert!(parse_date_param("06/15/2025").is_err());
    }

    #[test]
    fn test_windows_overlap() {
        assert!(windows_overlap("09:00", "11:00", "10:00", "12:00"));
        assert!(windows_overlap("10:00", "12:00", "09:00", "11:00"));
        // Touching endpoints do not overlap
        assert!(!windows_overlap("09:00", "10:00", "10:00", "11:00"));
        assert!(!windows_overlap("12:00", "13:00", "09:00", "10:00"));
    }
}
