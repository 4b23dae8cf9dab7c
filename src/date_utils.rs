use std::str::FromStr;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::labels;
use crate::models::transaction::DATE_FORMAT;

/// Earliest date covered by the "all time" preset.
pub const EPOCH_FLOOR_YEAR: i32 = 2020;

const DAY_MS: i64 = 86_400_000;

/// Trait for query params that select a period by preset, reference date and
/// optional prev/next navigation.
pub trait PeriodFilterable {
    fn preset(&self) -> Option<&String>;
    fn reference_date(&self) -> Option<&String>;

    fn nav(&self) -> Option<&String> {
        None
    }

    fn resolve_preset(&self) -> PeriodPreset {
        self.preset()
            .and_then(|p| p.parse::<PeriodPreset>().ok())
            .unwrap_or_default()
    }

    /// Reference date after navigation; unparseable input falls back to today.
    fn resolve_reference(&self) -> NaiveDate {
        let base = self
            .reference_date()
            .and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
            .unwrap_or_else(today);

        let preset = self.resolve_preset();
        match self.nav().map(|s| s.as_str()) {
            Some("prev") => shift_reference(preset, base, -1),
            Some("next") => shift_reference(preset, base, 1),
            _ => base,
        }
    }

    fn resolve_date_range(&self) -> DateRange {
        DateRange::from_preset(self.resolve_preset(), self.resolve_reference())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPreset {
    #[serde(rename = "today", alias = "day")]
    Day,
    Week,
    #[default]
    Month,
    Year,
    #[serde(rename = "all", alias = "all_time")]
    AllTime,
}

impl FromStr for PeriodPreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" | "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" | "all_time" => Ok(Self::AllTime),
            _ => Err(()),
        }
    }
}

impl PeriodPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::AllTime => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "Hoje",
            Self::Week => "Semana",
            Self::Month => "Mês",
            Self::Year => "Ano",
            Self::AllTime => "Tudo",
        }
    }

    pub fn all() -> &'static [PeriodPreset] {
        &[
            Self::Day,
            Self::Week,
            Self::Month,
            Self::Year,
            Self::AllTime,
        ]
    }
}

/// Inclusive instant range: `start` at 00:00:00.000 of its day, `end` at
/// 23:59:59.999 of its day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub preset: Option<PeriodPreset>,
}

impl DateRange {
    pub fn from_preset(preset: PeriodPreset, reference: NaiveDate) -> Self {
        resolve_range(preset, reference)
    }

    /// Custom range covering the calendar days `from..=to`.
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            start: start_of_day(from),
            end: end_of_day(to),
            preset: None,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// `ceil((end - start) / 1 day)`, 0 for an inverted range.
    pub fn day_span(&self) -> i64 {
        let ms = (self.end - self.start).num_milliseconds();
        if ms <= 0 {
            return 0;
        }
        (ms + DAY_MS - 1) / DAY_MS
    }

    /// Whether a calendar date, taken at local midday, falls inside the range.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        let instant = midday(date);
        instant >= self.start && instant <= self.end
    }

    /// Every calendar day from `start` to `end`, inclusive.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date();
        self.start_date()
            .iter_days()
            .take_while(move |d| *d <= end)
    }

    /// `"Jan. à Dez. 2026"` for an exact calendar year, otherwise
    /// `"01/04/24 à 30/04/24"`.
    pub fn display_label(&self) -> String {
        let (from, to) = (self.start_date(), self.end_date());
        if from.month() == 1
            && from.day() == 1
            && to.month() == 12
            && to.day() == 31
            && from.year() == to.year()
        {
            return format!("Jan. à Dez. {}", from.year());
        }
        format!("{} à {}", labels::ddmmyy(from), labels::ddmmyy(to))
    }

    /// `"5 Jan"` for a single day, otherwise `"1 Jan - 31 Jan"`.
    pub fn short_label(&self) -> String {
        let (from, to) = (self.start_date(), self.end_date());
        if from == to {
            return format!("{} {}", from.day(), labels::month_short(from.month0()));
        }
        format!(
            "{} {} - {} {}",
            from.day(),
            labels::month_short(from.month0()),
            to.day(),
            labels::month_short(to.month0())
        )
    }
}

/// Resolve a preset against a reference date; "all time" ends on the real
/// current date.
pub fn resolve_range(preset: PeriodPreset, reference: NaiveDate) -> DateRange {
    resolve_range_at(preset, reference, today())
}

/// Same as [`resolve_range`] with "today" supplied by the caller.
pub fn resolve_range_at(preset: PeriodPreset, reference: NaiveDate, today: NaiveDate) -> DateRange {
    let (from, to) = match preset {
        PeriodPreset::Day => (reference, reference),
        PeriodPreset::Week => {
            let start = week_start(reference);
            let end = start
                .checked_add_signed(Duration::days(6))
                .unwrap_or(NaiveDate::MAX);
            (start, end)
        }
        PeriodPreset::Month => (month_start(reference), month_end(reference)),
        PeriodPreset::Year => (year_start(reference), year_end(reference)),
        PeriodPreset::AllTime => (epoch_floor(), today),
    };

    DateRange {
        start: start_of_day(from),
        end: end_of_day(to),
        preset: Some(preset),
    }
}

/// Move a reference date by whole periods of `preset`.
pub fn shift_reference(preset: PeriodPreset, reference: NaiveDate, steps: i32) -> NaiveDate {
    let shifted = match preset {
        PeriodPreset::Day => reference.checked_add_signed(Duration::days(steps as i64)),
        PeriodPreset::Week => reference.checked_add_signed(Duration::weeks(steps as i64)),
        PeriodPreset::Month => shift_months(reference, steps),
        PeriodPreset::Year => shift_months(reference, steps * 12),
        PeriodPreset::AllTime => Some(reference),
    };
    shifted.unwrap_or(reference)
}

/// Format a stored `YYYY-MM-DD` string as `dd/mm/yy`; `"-"` when absent or
/// unparseable.
pub fn format_date_ddmmyy(date: Option<&str>) -> String {
    date.and_then(|d| NaiveDate::parse_from_str(d, DATE_FORMAT).ok())
        .map(labels::ddmmyy)
        .unwrap_or_else(|| "-".to_string())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date`, `23:59:59.999`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(date))
}

/// Transactions carry no time of day; they are placed at 12:00 so the day
/// boundaries never cut through them.
pub fn midday(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap_or_else(|| start_of_day(date))
}

fn epoch_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(EPOCH_FLOOR_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Sunday on or before `date`, clamped to the first representable date.
fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_sunday = date.weekday().num_days_from_sunday();
    date.checked_sub_signed(Duration::days(days_from_sunday as i64))
        .unwrap_or(NaiveDate::MIN)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

fn year_start(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_range_boundaries() {
        let range = resolve_range_at(PeriodPreset::Day, date(2026, 1, 14), date(2026, 3, 1));
        assert_eq!(range.start_date(), date(2026, 1, 14));
        assert_eq!(range.end_date(), date(2026, 1, 14));
        assert_eq!(range.start.time(), NaiveTime::MIN);
        assert_eq!(range.end.hour(), 23);
        assert_eq!(range.end.minute(), 59);
        assert_eq!(range.end.second(), 59);
        assert_eq!(range.end.nanosecond(), 999_000_000);
        assert_eq!(range.day_span(), 1);
        assert_eq!(range.short_label(), "14 Jan");
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2026-01-14 is a Wednesday
        let range = resolve_range_at(PeriodPreset::Week, date(2026, 1, 14), date(2026, 3, 1));
        assert_eq!(range.start_date(), date(2026, 1, 11));
        assert_eq!(range.end_date(), date(2026, 1, 17));
    }

    #[test]
    fn test_week_on_any_weekday() {
        let mut d = date(2023, 12, 20);
        for _ in 0..60 {
            let range = resolve_range_at(PeriodPreset::Week, d, d);
            assert_eq!(range.start_date().weekday(), Weekday::Sun);
            assert_eq!(range.end_date().weekday(), Weekday::Sat);
            assert!(range.contains_date(d));
            assert_eq!(range.day_span(), 7);
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_month_end_handles_february() {
        let leap = resolve_range_at(PeriodPreset::Month, date(2024, 2, 10), date(2024, 2, 10));
        assert_eq!(leap.end_date(), date(2024, 2, 29));

        let common = resolve_range_at(PeriodPreset::Month, date(2023, 2, 28), date(2023, 2, 28));
        assert_eq!(common.start_date(), date(2023, 2, 1));
        assert_eq!(common.end_date(), date(2023, 2, 28));
    }

    #[test]
    fn test_month_end_for_every_month() {
        let expected = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        for (i, last) in expected.iter().enumerate() {
            let range =
                resolve_range_at(PeriodPreset::Month, date(2025, i as u32 + 1, 15), date(2025, 1, 1));
            assert_eq!(range.end_date().day(), *last, "month {}", i + 1);
        }
        let dec = resolve_range_at(PeriodPreset::Month, date(2025, 12, 31), date(2025, 1, 1));
        assert_eq!(dec.end_date(), date(2025, 12, 31));
    }

    #[test]
    fn test_year_range() {
        let range = resolve_range_at(PeriodPreset::Year, date(2026, 6, 30), date(2026, 6, 30));
        assert_eq!(range.start_date(), date(2026, 1, 1));
        assert_eq!(range.end_date(), date(2026, 12, 31));
        assert_eq!(range.day_span(), 365);
        assert_eq!(range.display_label(), "Jan. à Dez. 2026");
    }

    #[test]
    fn test_all_time_ends_today_not_reference() {
        let range = resolve_range_at(PeriodPreset::AllTime, date(2021, 3, 3), date(2026, 10, 18));
        assert_eq!(range.start_date(), date(EPOCH_FLOOR_YEAR, 1, 1));
        assert_eq!(range.end_date(), date(2026, 10, 18));
    }

    #[test]
    fn test_start_never_after_end() {
        let reference = date(2024, 2, 29);
        for preset in PeriodPreset::all() {
            let range = resolve_range_at(*preset, reference, date(2026, 1, 1));
            assert!(range.is_valid(), "{:?}", preset);
        }
    }

    #[test]
    fn test_contains_date_uses_midday() {
        let range = DateRange::from_dates(date(2026, 1, 1), date(2026, 1, 31));
        assert!(range.contains_date(date(2026, 1, 1)));
        assert!(range.contains_date(date(2026, 1, 31)));
        assert!(!range.contains_date(date(2025, 12, 31)));
        assert!(!range.contains_date(date(2026, 2, 1)));
        assert_eq!(range.days().count(), 31);
    }

    #[test]
    fn test_preset_parse_roundtrip() {
        for preset in PeriodPreset::all() {
            assert_eq!(preset.as_str().parse::<PeriodPreset>(), Ok(*preset));
        }
        assert!("fortnight".parse::<PeriodPreset>().is_err());
        assert_eq!(PeriodPreset::Week.label(), "Semana");
    }

    #[test]
    fn test_shift_reference() {
        assert_eq!(
            shift_reference(PeriodPreset::Month, date(2024, 1, 31), 1),
            date(2024, 2, 29)
        );
        assert_eq!(
            shift_reference(PeriodPreset::Month, date(2024, 1, 15), -1),
            date(2023, 12, 15)
        );
        assert_eq!(
            shift_reference(PeriodPreset::Week, date(2026, 1, 14), -1),
            date(2026, 1, 7)
        );
        assert_eq!(
            shift_reference(PeriodPreset::Year, date(2024, 2, 29), 1),
            date(2025, 2, 28)
        );
        assert_eq!(
            shift_reference(PeriodPreset::AllTime, date(2024, 2, 29), 3),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_extreme_reference_dates_resolve() {
        let today = date(2026, 1, 14);
        for &preset in PeriodPreset::all() {
            for reference in [NaiveDate::MAX, NaiveDate::MIN] {
                let range = resolve_range_at(preset, reference, today);
                assert!(range.is_valid(), "{:?} at {}", preset, reference);
                if preset != PeriodPreset::AllTime {
                    assert!(range.contains_date(reference), "{:?} at {}", preset, reference);
                }
                assert!(range.day_span() >= 1);
            }
        }

        let week = resolve_range_at(PeriodPreset::Week, NaiveDate::MAX, today);
        assert_eq!(week.end_date(), NaiveDate::MAX);
        assert_eq!(week.end.nanosecond(), 999_000_000);

        let week = resolve_range_at(PeriodPreset::Week, NaiveDate::MIN, today);
        assert_eq!(week.start_date(), NaiveDate::MIN);
    }

    #[test]
    fn test_shift_reference_saturates_at_bounds() {
        for &preset in PeriodPreset::all() {
            assert_eq!(shift_reference(preset, NaiveDate::MAX, 1), NaiveDate::MAX);
            assert_eq!(shift_reference(preset, NaiveDate::MIN, -1), NaiveDate::MIN);
        }
    }

    #[test]
    fn test_display_labels() {
        let april = DateRange::from_dates(date(2024, 4, 1), date(2024, 4, 30));
        assert_eq!(april.display_label(), "01/04/24 à 30/04/24");
        assert_eq!(april.short_label(), "1 Abr - 30 Abr");
        assert_eq!(format_date_ddmmyy(Some("2026-01-05")), "05/01/26");
        assert_eq!(format_date_ddmmyy(Some("not a date")), "-");
        assert_eq!(format_date_ddmmyy(None), "-");
    }
}
