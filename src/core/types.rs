use serde::Serialize;

/// Age the SIP plan funds withdrawals through.
pub const PLAN_END_AGE: u32 = 90;

/// Upper bound on emitted year records for either projection.
pub const MAX_PROJECTION_YEARS: u32 = 100;

/// Validated inputs for the corpus drawdown projection. Rates are in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusInputs {
    pub current_expenses: f64,
    pub current_investment: f64,
    pub expenses_increment_per_year: f64,
    pub expected_rate_of_return: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusYearRecord {
    pub year: u32,
    pub start_balance: f64,
    pub withdrawal: f64,
    pub interest_earned: f64,
    pub end_balance: f64,
}

/// Validated inputs for the SIP plan. Rates are in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipInputs {
    pub current_age: u32,
    pub retirement_age: u32,
    pub annual_expense: f64,
    pub expected_inflation: f64,
    pub expected_return_during_investment: f64,
    pub expected_return_after_retirement: f64,
}

impl SipInputs {
    pub fn years_to_retirement(&self) -> u32 {
        self.retirement_age.saturating_sub(self.current_age)
    }

    pub fn years_in_retirement(&self) -> u32 {
        PLAN_END_AGE.saturating_sub(self.retirement_age)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SipPhase {
    Accumulation,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipYearRecord {
    pub year: u32,
    pub age: u32,
    pub monthly_investment: f64,
    pub withdrawal: f64,
    pub interest_earned: f64,
    pub end_corpus: f64,
    pub phase: SipPhase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipPlanResult {
    pub required_corpus: f64,
    #[serde(rename = "monthlySIP")]
    pub monthly_sip: f64,
    pub year_records: Vec<SipYearRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusSummary {
    pub years_lasted: u32,
    pub final_balance: f64,
    pub total_withdrawn: f64,
    pub total_interest: f64,
    /// True only when the last year ended at zero. False when the projection stopped at
    /// the year cap with money left, or when there are no years at all.
    pub depleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SipSummary {
    pub years_to_retirement: u32,
    pub retirement_duration: u32,
    pub corpus_at_retirement: f64,
    pub final_corpus: f64,
    pub total_invested: f64,
    pub total_withdrawn: f64,
    /// Every withdrawal year up to age 89 drew that year's full expense.
    pub lasts_until_plan_end: bool,
}
