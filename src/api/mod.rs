pub mod cli;
pub mod currency;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    CorpusDraft, CorpusSummary, CorpusYearRecord, FieldError, SipDraft, SipPlanResult, SipSummary,
    SipYearRecord, ValidationErrors, run_corpus_depletion, run_sip_plan, summarize_corpus,
    summarize_sip_plan, validate_corpus_inputs, validate_sip_inputs,
};
use currency::{Currency, format_currency};

pub use cli::{Cli, Command};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CorpusPayload {
    current_expenses: Option<f64>,
    current_investment: Option<f64>,
    expenses_increment_per_year: Option<f64>,
    expected_rate_of_return: Option<f64>,
    currency: Option<Currency>,
}

impl CorpusPayload {
    fn into_draft(self) -> CorpusDraft {
        let defaults = CorpusDraft::default();
        CorpusDraft {
            current_expenses: self.current_expenses.unwrap_or(defaults.current_expenses),
            current_investment: self
                .current_investment
                .unwrap_or(defaults.current_investment),
            expenses_increment_per_year: self
                .expenses_increment_per_year
                .unwrap_or(defaults.expenses_increment_per_year),
            expected_rate_of_return: self
                .expected_rate_of_return
                .unwrap_or(defaults.expected_rate_of_return),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SipPayload {
    current_age: Option<i64>,
    retirement_age: Option<i64>,
    annual_expense: Option<f64>,
    expected_inflation: Option<f64>,
    expected_return_during_investment: Option<f64>,
    expected_return_after_retirement: Option<f64>,
    currency: Option<Currency>,
}

impl SipPayload {
    fn into_draft(self) -> SipDraft {
        let defaults = SipDraft::default();
        SipDraft {
            current_age: self.current_age.unwrap_or(defaults.current_age),
            retirement_age: self.retirement_age.unwrap_or(defaults.retirement_age),
            annual_expense: self.annual_expense.unwrap_or(defaults.annual_expense),
            expected_inflation: self
                .expected_inflation
                .unwrap_or(defaults.expected_inflation),
            expected_return_during_investment: self
                .expected_return_during_investment
                .unwrap_or(defaults.expected_return_during_investment),
            expected_return_after_retirement: self
                .expected_return_after_retirement
                .unwrap_or(defaults.expected_return_after_retirement),
        }
    }
}

/// Key figures pre-formatted in the requested currency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusDisplay {
    pub final_balance: String,
    pub total_withdrawn: String,
    pub total_interest: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusResponse {
    pub currency: Currency,
    pub summary: CorpusSummary,
    pub display: CorpusDisplay,
    pub years: Vec<CorpusYearRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipDisplay {
    pub required_corpus: String,
    #[serde(rename = "monthlySIP")]
    pub monthly_sip: String,
    pub corpus_at_retirement: String,
    pub final_corpus: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipResponse {
    pub currency: Currency,
    pub required_corpus: f64,
    #[serde(rename = "monthlySIP")]
    pub monthly_sip: f64,
    pub summary: SipSummary,
    pub display: SipDisplay,
    pub years: Vec<SipYearRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn build_corpus_response(
    currency: Currency,
    summary: CorpusSummary,
    years: Vec<CorpusYearRecord>,
) -> CorpusResponse {
    CorpusResponse {
        currency,
        summary,
        display: CorpusDisplay {
            final_balance: format_currency(summary.final_balance, currency),
            total_withdrawn: format_currency(summary.total_withdrawn, currency),
            total_interest: format_currency(summary.total_interest, currency),
        },
        years,
    }
}

pub fn build_sip_response(
    currency: Currency,
    summary: SipSummary,
    plan: SipPlanResult,
) -> SipResponse {
    SipResponse {
        currency,
        required_corpus: plan.required_corpus,
        monthly_sip: plan.monthly_sip,
        summary,
        display: SipDisplay {
            required_corpus: format_currency(plan.required_corpus, currency),
            monthly_sip: format_currency(plan.monthly_sip, currency),
            corpus_at_retirement: format_currency(summary.corpus_at_retirement, currency),
            final_corpus: format_currency(summary.final_corpus, currency),
        },
        years: plan.year_records,
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/corpus",
            get(corpus_get_handler).post(corpus_post_handler),
        )
        .route("/api/sip", get(sip_get_handler).post(sip_post_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "retirement planner HTTP API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn corpus_get_handler(payload: Result<Query<CorpusPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => corpus_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn corpus_post_handler(payload: Result<Json<CorpusPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => corpus_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn sip_get_handler(payload: Result<Query<SipPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => sip_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

async fn sip_post_handler(payload: Result<Json<SipPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => sip_handler_impl(payload),
        Err(rejection) => rejected_payload_response(&rejection.body_text()),
    }
}

fn corpus_handler_impl(payload: CorpusPayload) -> Response {
    let currency = payload.currency.unwrap_or_default();
    let inputs = match validate_corpus_inputs(&payload.into_draft()) {
        Ok(inputs) => inputs,
        Err(errors) => return validation_error_response(errors),
    };

    let records = run_corpus_depletion(&inputs);
    let summary = summarize_corpus(&records);
    info!(
        years = summary.years_lasted,
        depleted = summary.depleted,
        "corpus projection served"
    );
    json_response(
        StatusCode::OK,
        build_corpus_response(currency, summary, records),
    )
}

fn sip_handler_impl(payload: SipPayload) -> Response {
    let currency = payload.currency.unwrap_or_default();
    let inputs = match validate_sip_inputs(&payload.into_draft()) {
        Ok(inputs) => inputs,
        Err(errors) => return validation_error_response(errors),
    };

    let plan = run_sip_plan(&inputs);
    let summary = summarize_sip_plan(&inputs, &plan);
    info!(
        current_age = inputs.current_age,
        retirement_age = inputs.retirement_age,
        monthly_sip = plan.monthly_sip,
        "SIP plan served"
    );
    json_response(StatusCode::OK, build_sip_response(currency, summary, plan))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            field_errors: Vec::new(),
        },
    )
}

/// Undecodable request bodies and query strings get the same JSON error shape as
/// validation failures.
fn rejected_payload_response(msg: &str) -> Response {
    warn!(error = msg, "rejected malformed request");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn validation_error_response(errors: ValidationErrors) -> Response {
    warn!(%errors, "rejected invalid inputs");
    json_response(
        StatusCode::BAD_REQUEST,
        ErrorResponse {
            error: errors.to_string(),
            field_errors: errors.0,
        },
    )
}

#[cfg(test)]
fn corpus_draft_from_json(json: &str) -> Result<CorpusDraft, String> {
    serde_json::from_str::<CorpusPayload>(json)
        .map(CorpusPayload::into_draft)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))
}

#[cfg(test)]
fn sip_draft_from_json(json: &str) -> Result<SipDraft, String> {
    serde_json::from_str::<SipPayload>(json)
        .map(SipPayload::into_draft)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))
}
