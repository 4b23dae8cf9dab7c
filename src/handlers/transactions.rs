use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::date_utils::{format_date_ddmmyy, PeriodFilterable};
use crate::error::{AppError, AppResult};
use crate::labels;
use crate::models::{NewTransaction, Transaction, TransactionKind, TransactionPatch};
use crate::services::filter::{self, TransactionQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub preset: Option<String>,
    pub date: Option<String>,
    pub nav: Option<String>,
    pub kind: Option<String>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl PeriodFilterable for TransactionListParams {
    fn preset(&self) -> Option<&String> {
        self.preset.as_ref()
    }

    fn reference_date(&self) -> Option<&String> {
        self.date.as_ref()
    }

    fn nav(&self) -> Option<&String> {
        self.nav.as_ref()
    }
}

/// A transaction plus its table display values.
#[derive(Debug, Serialize)]
pub struct TransactionRow {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub kind_label: &'static str,
    pub amount_display: String,
    /// `dd/mm/yy`, `"-"` for a malformed date.
    pub date_display: String,
    pub due_date_display: String,
}

impl From<Transaction> for TransactionRow {
    fn from(transaction: Transaction) -> Self {
        Self {
            kind_label: transaction.kind.label(),
            amount_display: labels::format_brl(transaction.amount_cents),
            date_display: format_date_ddmmyy(Some(&transaction.date)),
            due_date_display: format_date_ddmmyy(transaction.due_date.as_deref()),
            transaction,
        }
    }
}

pub fn to_rows(transactions: Vec<Transaction>) -> Vec<TransactionRow> {
    transactions.into_iter().map(TransactionRow::from).collect()
}

impl TransactionListParams {
    /// `kind=all` (or no kind) selects every kind.
    fn query(&self) -> AppResult<TransactionQuery> {
        let kind = match self.kind.as_deref().map(str::trim) {
            None | Some("") | Some("all") | Some("todas") => None,
            Some(s) => Some(
                TransactionKind::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("Unknown transaction kind: {}", s)))?,
            ),
        };
        Ok(TransactionQuery {
            kind,
            search: self.search.clone(),
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<TransactionListParams>,
) -> AppResult<Json<Vec<TransactionRow>>> {
    let query = params.query()?;
    let range = params.resolve_date_range();

    let all = state.load_transactions()?;
    let mut matched = filter::filter_with_query(&all, &range, &query);
    if let Some(limit) = params.limit {
        matched = filter::recent(&matched, limit);
    }

    Ok(Json(to_rows(matched)))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new_transaction): Json<NewTransaction>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    new_transaction.validate().map_err(AppError::Validation)?;

    let created = state.repo.create(new_transaction)?;
    info!(transaction_id = created.id, kind = %created.kind, "Transaction created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TransactionPatch>,
) -> AppResult<Json<Transaction>> {
    patch.validate().map_err(AppError::Validation)?;

    let updated = state.repo.update(id, &patch)?;
    info!(transaction_id = id, "Transaction updated");

    Ok(Json(updated))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.repo.delete(id)?;
    info!(transaction_id = id, "Transaction deleted");

    Ok(StatusCode::NO_CONTENT)
}
