use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::date_utils::{DateRange, PeriodFilterable, PeriodPreset};
use crate::error::{AppError, AppResult};
use crate::services::analytics::{self, BreakdownBy, BreakdownEntry};
use crate::services::filter;
use crate::state::AppState;

/// Period selection shared by every dashboard endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub preset: Option<String>,
    pub date: Option<String>,
    pub nav: Option<String>,
}

impl PeriodFilterable for PeriodParams {
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

#[derive(Debug, Serialize)]
pub struct RangeResponse {
    pub preset: PeriodPreset,
    pub label: &'static str,
    pub reference: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub day_span: i64,
    pub display: String,
    pub short: String,
}

impl RangeResponse {
    pub fn new(preset: PeriodPreset, reference: NaiveDate, range: &DateRange) -> Self {
        Self {
            preset,
            label: preset.label(),
            reference,
            start: range.start,
            end: range.end,
            day_span: range.day_span(),
            display: range.display_label(),
            short: range.short_label(),
        }
    }

    pub fn from_params(params: &PeriodParams) -> (Self, DateRange) {
        let preset = params.resolve_preset();
        let reference = params.resolve_reference();
        let range = DateRange::from_preset(preset, reference);
        (Self::new(preset, reference, &range), range)
    }
}

pub async fn range(Query(params): Query<PeriodParams>) -> Json<RangeResponse> {
    let (response, _) = RangeResponse::from_params(&params);
    Json(response)
}

#[derive(Debug, Default, Deserialize)]
pub struct BreakdownParams {
    pub preset: Option<String>,
    pub date: Option<String>,
    pub nav: Option<String>,
    pub by: Option<String>,
    pub top: Option<bool>,
}

impl PeriodFilterable for BreakdownParams {
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

pub async fn breakdown(
    State(state): State<AppState>,
    Query(params): Query<BreakdownParams>,
) -> AppResult<Json<Vec<BreakdownEntry>>> {
    let by = match params.by.as_deref() {
        None => BreakdownBy::default(),
        Some(s) => s
            .parse::<BreakdownBy>()
            .map_err(|_| AppError::Validation(format!("Unknown breakdown: {}", s)))?,
    };

    let range = params.resolve_date_range();
    let all = state.load_transactions()?;
    let in_range = filter::filter_transactions(&all, &range, |_| true);

    let entries = if params.top.unwrap_or(false) {
        analytics::top_groups(&in_range, by)
    } else {
        analytics::expense_breakdown(&in_range, by)
    };

    Ok(Json(entries))
}
