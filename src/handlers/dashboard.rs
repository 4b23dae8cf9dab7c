use axum::extract::{Query, State};
use axum::response::Json;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::AppResult;
use crate::handlers::api::{PeriodParams, RangeResponse};
use crate::handlers::transactions::{to_rows, TransactionRow};
use crate::labels;
use crate::services::analytics::{self, BreakdownBy, BreakdownEntry, BucketSummary, Granularity, Totals};
use crate::services::filter;
use crate::state::AppState;

/// Rows shown in the "recent transactions" widget.
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct Extent {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

/// Pre-formatted values for the summary cards.
#[derive(Debug, Serialize)]
pub struct SummaryCards {
    pub income: String,
    pub expense: String,
    pub investment: String,
    pub balance: String,
    pub savings_rate: String,
    pub investment_rate: String,
}

impl SummaryCards {
    fn from_totals(totals: &Totals) -> Self {
        Self {
            income: labels::format_brl(totals.sums.income_cents),
            expense: labels::format_brl(totals.sums.expense_cents),
            investment: labels::format_brl(totals.sums.investment_cents),
            balance: labels::format_brl(totals.sums.balance_cents),
            savings_rate: labels::format_percent(totals.savings_rate),
            investment_rate: labels::format_percent(totals.investment_rate),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub range: RangeResponse,
    pub totals: Totals,
    pub cards: SummaryCards,
    pub granularity: Granularity,
    pub buckets: Vec<BucketSummary>,
    pub top_categories: Vec<BreakdownEntry>,
    pub classifications: Vec<BreakdownEntry>,
    pub recent: Vec<TransactionRow>,
    /// Dates of the oldest and newest transaction, bounds for period
    /// navigation.
    pub extent: Option<Extent>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<PeriodParams>,
) -> AppResult<Json<DashboardResponse>> {
    let (range_info, range) = RangeResponse::from_params(&params);
    debug!(start = %range.start, end = %range.end, "Loading dashboard");

    let all = state.load_transactions()?;
    let in_range = filter::filter_transactions(&all, &range, |_| true);
    let aggregation = analytics::aggregate(&in_range, &range);

    let response = DashboardResponse {
        range: range_info,
        cards: SummaryCards::from_totals(&aggregation.totals),
        totals: aggregation.totals,
        granularity: aggregation.granularity,
        buckets: aggregation.buckets,
        top_categories: analytics::top_groups(&in_range, BreakdownBy::Category),
        classifications: analytics::expense_breakdown(&in_range, BreakdownBy::Classification),
        recent: to_rows(filter::recent(&in_range, RECENT_LIMIT)),
        extent: filter::date_extent(&all).map(|(min, max)| Extent { min, max }),
    };

    debug!(
        transactions = response.totals.transaction_count,
        buckets = response.buckets.len(),
        "Dashboard data loaded"
    );

    Ok(Json(response))
}
