//! Time-bucketed and grouped aggregation of a transaction snapshot for the
//! dashboard charts and summary cards.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::date_utils::DateRange;
use crate::labels;
use crate::models::{Transaction, TransactionKind};

/// Ranges spanning more days than this are bucketed by month.
pub const DAILY_MAX_SPAN_DAYS: i64 = 365;

/// Daily buckets of ranges up to this many days also carry the weekday.
pub const WEEKDAY_LABEL_MAX_SPAN_DAYS: i64 = 12;

/// Number of groups kept by [`top_groups`].
pub const TOP_GROUPS: usize = 7;

pub const FALLBACK_GROUP: &str = "Outros";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn for_range(range: &DateRange) -> Self {
        if range.day_span() <= DAILY_MAX_SPAN_DAYS {
            Granularity::Daily
        } else {
            Granularity::Monthly
        }
    }
}

/// Structured identity of a bucket. `weekday` counts from Sunday = 0 and
/// `month` from January = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BucketKey {
    Day { date: NaiveDate, weekday: u32 },
    Month { year: i32, month: u32 },
}

impl BucketKey {
    pub fn day(date: NaiveDate) -> Self {
        BucketKey::Day {
            date,
            weekday: date.weekday().num_days_from_sunday(),
        }
    }

    pub fn month(year: i32, month0: u32) -> Self {
        BucketKey::Month {
            year,
            month: month0,
        }
    }

    /// Key of the bucket a date falls into at the given granularity.
    pub fn of(date: NaiveDate, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Daily => Self::day(date),
            Granularity::Monthly => Self::month(date.year(), date.month0()),
        }
    }

    pub fn sort_key(&self) -> String {
        match self {
            BucketKey::Day { date, .. } => date.format("%Y-%m-%d").to_string(),
            BucketKey::Month { year, month } => format!("{:04}-{:02}", year, month + 1),
        }
    }
}

/// Per-kind sums in cents. `balance_cents` is always income minus expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTotals {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub investment_cents: i64,
    pub balance_cents: i64,
}

impl KindTotals {
    pub fn add(&mut self, transaction: &Transaction) {
        match transaction.kind {
            TransactionKind::Income => self.income_cents += transaction.amount_cents,
            TransactionKind::Expense => self.expense_cents += transaction.amount_cents,
            TransactionKind::Investment => self.investment_cents += transaction.amount_cents,
        }
        self.balance_cents = self.income_cents - self.expense_cents;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketSummary {
    pub label: String,
    pub tooltip: String,
    pub sort_key: String,
    pub key: BucketKey,
    #[serde(flatten)]
    pub totals: KindTotals,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Totals {
    #[serde(flatten)]
    pub sums: KindTotals,
    pub transaction_count: usize,
    /// Balance as a share of income.
    pub savings_rate: f64,
    /// Investment as a share of income.
    pub investment_rate: f64,
}

impl Totals {
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut sums = KindTotals::default();
        let mut transaction_count = 0;
        for transaction in transactions {
            sums.add(transaction);
            transaction_count += 1;
        }
        Self {
            sums,
            transaction_count,
            savings_rate: labels::percent_of(sums.balance_cents, sums.income_cents),
            investment_rate: labels::percent_of(sums.investment_cents, sums.income_cents),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Aggregation {
    pub granularity: Granularity,
    pub buckets: Vec<BucketSummary>,
    pub totals: Totals,
}

impl Aggregation {
    fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            buckets: Vec::new(),
            totals: Totals::default(),
        }
    }
}

/// Bucket `transactions` over `range` and compute grand totals.
///
/// Daily mode emits one bucket per calendar day of the range. Monthly mode
/// always emits the twelve months of the range's starting year. Only
/// transactions dated inside the range are counted; grand totals are summed
/// straight from those transactions rather than from the buckets.
pub fn aggregate(transactions: &[Transaction], range: &DateRange) -> Aggregation {
    let granularity = Granularity::for_range(range);

    debug_assert!(range.is_valid(), "range start is after its end");
    if !range.is_valid() {
        warn!(start = %range.start, end = %range.end, "Inverted date range, returning empty aggregation");
        return Aggregation::empty(granularity);
    }

    let dated: Vec<(NaiveDate, &Transaction)> = transactions
        .iter()
        .filter_map(|t| match t.parsed_date() {
            Some(date) => Some((date, t)),
            None => {
                warn!(transaction_id = t.id, date = %t.date, "Skipping transaction with malformed date");
                None
            }
        })
        .filter(|(date, _)| range.contains_date(*date))
        .collect();

    let mut per_bucket: HashMap<BucketKey, KindTotals> = HashMap::new();
    for (date, transaction) in &dated {
        per_bucket
            .entry(BucketKey::of(*date, granularity))
            .or_default()
            .add(transaction);
    }

    let buckets = match granularity {
        Granularity::Daily => daily_buckets(range, &per_bucket),
        Granularity::Monthly => monthly_buckets(range.start_date().year(), &per_bucket),
    };
    let totals = Totals::from_transactions(dated.iter().map(|(_, t)| *t));

    debug!(
        granularity = ?granularity,
        buckets = buckets.len(),
        transactions = totals.transaction_count,
        "Aggregated transactions"
    );

    Aggregation {
        granularity,
        buckets,
        totals,
    }
}

fn daily_buckets(range: &DateRange, per_bucket: &HashMap<BucketKey, KindTotals>) -> Vec<BucketSummary> {
    let with_weekday = range.day_span() <= WEEKDAY_LABEL_MAX_SPAN_DAYS;
    range
        .days()
        .map(|date| {
            let key = BucketKey::day(date);
            BucketSummary {
                label: labels::day_label(date, with_weekday),
                tooltip: labels::day_tooltip(date),
                sort_key: key.sort_key(),
                totals: per_bucket.get(&key).copied().unwrap_or_default(),
                key,
            }
        })
        .collect()
}

fn monthly_buckets(year: i32, per_bucket: &HashMap<BucketKey, KindTotals>) -> Vec<BucketSummary> {
    (0..12)
        .map(|month0| {
            let key = BucketKey::month(year, month0);
            BucketSummary {
                label: labels::month_short(month0).to_string(),
                tooltip: labels::month_tooltip(year, month0),
                sort_key: key.sort_key(),
                totals: per_bucket.get(&key).copied().unwrap_or_default(),
                key,
            }
        })
        .collect()
}

/// Label an expense is grouped under in a breakdown chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakdownBy {
    #[default]
    Category,
    /// Subcategory, falling back to the destination when unset.
    Subcategory,
    Destination,
    Classification,
}

impl FromStr for BreakdownBy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "subcategory" => Ok(Self::Subcategory),
            "destination" => Ok(Self::Destination),
            "classification" => Ok(Self::Classification),
            _ => Err(()),
        }
    }
}

impl BreakdownBy {
    pub fn group_of<'a>(&self, transaction: &'a Transaction) -> &'a str {
        let label = match self {
            BreakdownBy::Category => transaction.category.as_deref(),
            BreakdownBy::Subcategory => transaction
                .subcategory
                .as_deref()
                .filter(|s| !s.is_empty())
                .or(Some(transaction.destination.as_str())),
            BreakdownBy::Destination => Some(transaction.destination.as_str()),
            BreakdownBy::Classification => transaction.classification.as_deref(),
        };
        label.filter(|l| !l.is_empty()).unwrap_or(FALLBACK_GROUP)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakdownEntry {
    pub name: String,
    pub total_cents: i64,
    /// Share of the total expense.
    pub percentage: f64,
    pub transaction_count: usize,
}

/// Expense totals grouped by `by`, largest first. Groups summing to zero are
/// left out.
pub fn expense_breakdown(transactions: &[Transaction], by: BreakdownBy) -> Vec<BreakdownEntry> {
    let mut groups: HashMap<&str, (i64, usize)> = HashMap::new();
    for transaction in transactions.iter().filter(|t| t.is_kind(TransactionKind::Expense)) {
        let entry = groups.entry(by.group_of(transaction)).or_insert((0, 0));
        entry.0 += transaction.amount_cents;
        entry.1 += 1;
    }

    let total: i64 = groups.values().map(|(sum, _)| sum).sum();

    let mut result: Vec<BreakdownEntry> = groups
        .into_iter()
        .filter(|(_, (sum, _))| *sum > 0)
        .map(|(name, (total_cents, transaction_count))| BreakdownEntry {
            name: name.to_string(),
            total_cents,
            percentage: labels::percent_of(total_cents, total),
            transaction_count,
        })
        .collect();

    result.sort_by(|a, b| {
        b.total_cents
            .cmp(&a.total_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    result
}

/// The [`TOP_GROUPS`] largest groups of [`expense_breakdown`]; the rest are
/// dropped rather than merged.
pub fn top_groups(transactions: &[Transaction], by: BreakdownBy) -> Vec<BreakdownEntry> {
    let mut breakdown = expense_breakdown(transactions, by);
    breakdown.truncate(TOP_GROUPS);
    breakdown
}
