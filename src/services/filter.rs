//! Date-range and predicate filtering over an in-memory transaction snapshot.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::date_utils::DateRange;
use crate::models::{Transaction, TransactionKind};

/// Optional predicates selected in the transactions view. Every active
/// predicate must hold.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    pub kind: Option<TransactionKind>,
    pub search: Option<String>,
}

impl TransactionQuery {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(kind) = self.kind {
            if !transaction.is_kind(kind) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => matches_search(transaction, term),
            _ => true,
        }
    }
}

/// Case-insensitive substring match over description, destination and
/// category.
pub fn matches_search(transaction: &Transaction, term: &str) -> bool {
    let term = term.to_lowercase();
    transaction.description.to_lowercase().contains(&term)
        || transaction.destination.to_lowercase().contains(&term)
        || transaction
            .category
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&term))
}

/// Transactions whose date (at local midday) lies in `range` and that satisfy
/// `predicate`, newest first. Rows with an unparseable date are skipped.
pub fn filter_transactions<P>(all: &[Transaction], range: &DateRange, predicate: P) -> Vec<Transaction>
where
    P: Fn(&Transaction) -> bool,
{
    let mut matched: Vec<(NaiveDate, &Transaction)> = all
        .iter()
        .filter_map(|t| match t.parsed_date() {
            Some(date) => Some((date, t)),
            None => {
                warn!(transaction_id = t.id, date = %t.date, "Skipping transaction with malformed date");
                None
            }
        })
        .filter(|(date, t)| range.contains_date(*date) && predicate(t))
        .collect();

    // sort_by is stable: same-day rows keep their input order
    matched.sort_by(|a, b| b.0.cmp(&a.0));

    debug!(
        total = all.len(),
        matched = matched.len(),
        "Filtered transactions"
    );
    matched.into_iter().map(|(_, t)| t.clone()).collect()
}

/// [`filter_transactions`] with the predicates of a [`TransactionQuery`].
pub fn filter_with_query(all: &[Transaction], range: &DateRange, query: &TransactionQuery) -> Vec<Transaction> {
    filter_transactions(all, range, |t| query.matches(t))
}

/// Earliest and latest parseable dates in the snapshot.
pub fn date_extent(all: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    all.iter()
        .filter_map(Transaction::parsed_date)
        .fold(None, |acc, date| match acc {
            None => Some((date, date)),
            Some((min, max)) => Some((min.min(date), max.max(date))),
        })
}

/// The first `n` entries of a newest-first list.
pub fn recent(sorted: &[Transaction], n: usize) -> Vec<Transaction> {
    sorted.iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: i64, date: &str, kind: TransactionKind, description: &str) -> Transaction {
        Transaction {
            id,
            date: date.into(),
            due_date: None,
            amount_cents: 1000,
            kind,
            description: description.into(),
            destination: String::new(),
            category: None,
            subcategory: None,
            classification: None,
            method: "Pix".into(),
            status: "Concluído".into(),
            installments: None,
        }
    }

    fn january() -> DateRange {
        DateRange::from_dates(date(2026, 1, 1), date(2026, 1, 31))
    }

    fn sample() -> Vec<Transaction> {
        let mut market = tx(4, "2026-01-10", TransactionKind::Expense, "Compras do mês");
        market.destination = "Supermercado".into();
        market.category = Some("Supermercado".into());
        vec![
            tx(1, "2026-01-05", TransactionKind::Income, "Recebimento Salário"),
            tx(2, "2026-01-05", TransactionKind::Expense, "Mensalidade Apto"),
            tx(3, "2026-02-02", TransactionKind::Expense, "Fevereiro"),
            market,
            tx(5, "2025-12-31", TransactionKind::Income, "Dezembro"),
            tx(6, "2026-01-31", TransactionKind::Investment, "Aporte CDB"),
        ]
    }

    #[test]
    fn test_filters_by_range_and_sorts_desc() {
        let result = filter_transactions(&sample(), &january(), |_| true);
        let ids: Vec<i64> = result.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![6, 4, 1, 2]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let once = filter_transactions(&sample(), &january(), |_| true);
        let twice = filter_transactions(&once, &january(), |_| true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_malformed_date_is_skipped() {
        let mut all = sample();
        all.push(tx(9, "31/01/2026", TransactionKind::Income, "Broken"));
        let result = filter_transactions(&all, &january(), |_| true);
        assert_eq!(result.len(), 4);
        assert!(result.iter().all(|t| t.id != 9));
    }

    #[test]
    fn test_query_combines_kind_and_search() {
        let query = TransactionQuery {
            kind: Some(TransactionKind::Expense),
            search: Some("SUPER".into()),
        };
        let result = filter_with_query(&sample(), &january(), &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 4);

        let kind_only = TransactionQuery {
            kind: Some(TransactionKind::Expense),
            search: Some("  ".into()),
        };
        let ids: Vec<i64> = filter_with_query(&sample(), &january(), &kind_only)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![4, 2]);
    }

    #[test]
    fn test_search_matches_description() {
        let query = TransactionQuery {
            search: Some("aporte".into()),
            ..Default::default()
        };
        let result = filter_with_query(&sample(), &january(), &query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 6);
    }

    #[test]
    fn test_date_extent_and_recent() {
        let all = sample();
        assert_eq!(
            date_extent(&all),
            Some((date(2025, 12, 31), date(2026, 2, 2)))
        );
        assert_eq!(date_extent(&[]), None);

        let sorted = filter_transactions(&all, &january(), |_| true);
        assert_eq!(recent(&sorted, 2).len(), 2);
        assert_eq!(recent(&sorted, 10).len(), 4);
    }
}
