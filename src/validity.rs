//! Publication-state classification.
//!
//! Every document gets exactly one [`Validity`]. The rules, in order:
//!
//! 1. `draft: true` (or the string `"true"`) → [`Validity::Draft`], whatever
//!    the date says.
//! 2. A `date` at least `max_age_days` old → [`Validity::Old`].
//! 3. Anything else → [`Validity::Valid`].
//!
//! [`Validity::Misformatted`] is never produced here: it is assigned when the
//! front matter itself cannot be read.
//!
//! Ages are computed in a fixed UTC offset rather than the host timezone, so
//! a build machine in UTC and a laptop in Tokyo agree on which posts are old.

use crate::frontmatter::{FieldValue, Metadata};
use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt;
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;

/// Publication state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Validity {
    /// Recent and published: shown in the sidebar and the gallery.
    Valid,
    /// Unpublished: images are extracted but never shown.
    Draft,
    /// Published but past the age threshold: gallery only.
    Old,
    /// Front matter missing or unreadable: contributes nothing.
    Misformatted,
}

impl Validity {
    pub fn in_sidebar(self) -> bool {
        self == Validity::Valid
    }

    pub fn in_gallery(self) -> bool {
        matches!(self, Validity::Valid | Validity::Old)
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Validity::Valid => "Valid",
            Validity::Draft => "Draft",
            Validity::Old => "Old",
            Validity::Misformatted => "Misformatted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidityError {
    #[error("unparseable date {0:?}")]
    UnparseableDate(String),
    #[error("date must be a timestamp, got {0}")]
    UnsupportedDate(String),
}

/// Classifies documents against one fixed evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    now: DateTime<FixedOffset>,
    max_age_days: u32,
}

impl Classifier {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset, max_age_days: u32) -> Self {
        Self {
            now: now.with_timezone(&offset),
            max_age_days,
        }
    }

    /// The evaluation instant, in the canonical offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.now
    }

    pub fn classify(&self, metadata: &Metadata) -> Result<Validity, ValidityError> {
        if is_draft(metadata) {
            return Ok(Validity::Draft);
        }

        if let Some(value) = metadata.get("date").filter(|v| !v.is_blank()) {
            let date = resolve_date(value, self.now.offset())?;
            if self.elapsed_days(date) >= i64::from(self.max_age_days) {
                return Ok(Validity::Old);
            }
        }

        Ok(Validity::Valid)
    }

    /// Whole days from `date` to now, rounded toward negative infinity.
    ///
    /// A date in the future yields a negative count.
    pub fn elapsed_days(&self, date: DateTime<FixedOffset>) -> i64 {
        (self.now - date).num_seconds().div_euclid(SECONDS_PER_DAY)
    }
}

fn is_draft(metadata: &Metadata) -> bool {
    match metadata.get("draft") {
        Some(FieldValue::Bool(flag)) => *flag,
        Some(FieldValue::String(s)) => s == "true",
        _ => false,
    }
}

/// Turn a `date` field into an instant. Naive values are read in `offset`.
fn resolve_date(
    value: &FieldValue,
    offset: &FixedOffset,
) -> Result<DateTime<FixedOffset>, ValidityError> {
    let parsed;
    let value = match value {
        FieldValue::String(text) => {
            parsed = FieldValue::parse_timestamp(text)
                .ok_or_else(|| ValidityError::UnparseableDate(text.clone()))?;
            &parsed
        }
        other => other,
    };

    match value {
        FieldValue::DateTime(dt) => Ok(*dt),
        FieldValue::LocalDateTime(naive) => in_offset(naive, offset),
        FieldValue::Date(date) => in_offset(&date.and_time(NaiveTime::MIN), offset),
        other => Err(ValidityError::UnsupportedDate(format!("{other:?}"))),
    }
}

fn in_offset(
    naive: &NaiveDateTime,
    offset: &FixedOffset,
) -> Result<DateTime<FixedOffset>, ValidityError> {
    offset
        .from_local_datetime(naive)
        .single()
        .ok_or_else(|| ValidityError::UnparseableDate(naive.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap()
    }

    fn classifier() -> Classifier {
        Classifier::new(now(), jst(), 2)
    }

    fn meta(pairs: &[(&str, FieldValue)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::String(s.to_string())
    }

    #[test]
    fn no_fields_is_valid() {
        assert_eq!(classifier().classify(&Metadata::new()), Ok(Validity::Valid));
    }

    #[test]
    fn draft_bool_is_draft() {
        let m = meta(&[("draft", FieldValue::Bool(true))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Draft));
    }

    #[test]
    fn draft_string_is_draft() {
        let m = meta(&[("draft", text("true"))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Draft));
    }

    #[test]
    fn draft_false_falls_through() {
        for value in [FieldValue::Bool(false), text("false"), text("yes")] {
            let m = meta(&[("draft", value)]);
            assert_eq!(classifier().classify(&m), Ok(Validity::Valid));
        }
    }

    #[test]
    fn old_draft_is_still_draft() {
        let m = meta(&[
            ("draft", FieldValue::Bool(true)),
            ("date", text("2020-01-01T00:00:00Z")),
        ]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Draft));
    }

    #[test]
    fn draft_with_garbage_date_is_still_draft() {
        let m = meta(&[("draft", FieldValue::Bool(true)), ("date", text("soon"))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Draft));
    }

    #[test]
    fn five_days_old_is_old() {
        let m = meta(&[("draft", FieldValue::Bool(false)), ("date", text("2024-01-01T00:00:00Z"))]);
        let c = classifier();
        let date = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(c.elapsed_days(date), 5);
        assert_eq!(c.classify(&m), Ok(Validity::Old));
    }

    #[test]
    fn exactly_threshold_is_old() {
        let date = (now() - Duration::days(2)).to_rfc3339();
        let m = meta(&[("date", text(&date))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Old));
    }

    #[test]
    fn one_second_short_of_threshold_is_valid() {
        let date = (now() - Duration::days(2) + Duration::seconds(1)).to_rfc3339();
        let m = meta(&[("date", text(&date))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Valid));
    }

    #[test]
    fn future_date_is_valid() {
        let m = meta(&[("date", text("2030-01-01T00:00:00Z"))]);
        let c = classifier();
        assert_eq!(c.classify(&m), Ok(Validity::Valid));
        let date = DateTime::parse_from_rfc3339("2024-01-06T12:00:00Z").unwrap();
        assert_eq!(c.elapsed_days(date), -1);
    }

    #[test]
    fn naive_date_read_in_fixed_offset() {
        // 2024-01-04T09:00:00 at +09:00 is 2024-01-04T00:00:00Z: exactly two days.
        let m = meta(&[("date", text("2024-01-04T09:00:00"))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Old));
        // Read as UTC it would only be 1d15h old.
        let utc = Classifier::new(now(), FixedOffset::east_opt(0).unwrap(), 2);
        let m = meta(&[("date", text("2024-01-04T09:00:00"))]);
        assert_eq!(utc.classify(&m), Ok(Validity::Valid));
    }

    #[test]
    fn native_date_value_accepted() {
        let date = chrono::NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let m = meta(&[("date", FieldValue::Date(date))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Old));
    }

    #[test]
    fn native_datetime_value_accepted() {
        let m = meta(&[("date", FieldValue::DateTime(now().with_timezone(&jst())))]);
        assert_eq!(classifier().classify(&m), Ok(Validity::Valid));
    }

    #[test]
    fn blank_date_counts_as_absent() {
        for value in [FieldValue::Null, text("")] {
            let m = meta(&[("date", value)]);
            assert_eq!(classifier().classify(&m), Ok(Validity::Valid));
        }
    }

    #[test]
    fn unparseable_date_is_error() {
        let m = meta(&[("date", text("last tuesday"))]);
        assert_eq!(
            classifier().classify(&m),
            Err(ValidityError::UnparseableDate("last tuesday".into()))
        );
    }

    #[test]
    fn non_timestamp_date_is_error() {
        let m = meta(&[("date", FieldValue::Number(20240101.0))]);
        assert!(matches!(
            classifier().classify(&m),
            Err(ValidityError::UnsupportedDate(_))
        ));
    }

    #[test]
    fn larger_threshold_keeps_post_valid() {
        let c = Classifier::new(now(), jst(), 7);
        let m = meta(&[("date", text("2024-01-01T00:00:00Z"))]);
        assert_eq!(c.classify(&m), Ok(Validity::Valid));
    }

    #[test]
    fn view_membership() {
        assert!(Validity::Valid.in_sidebar() && Validity::Valid.in_gallery());
        assert!(!Validity::Old.in_sidebar() && Validity::Old.in_gallery());
        assert!(!Validity::Draft.in_sidebar() && !Validity::Draft.in_gallery());
        assert!(!Validity::Misformatted.in_gallery());
    }
}
