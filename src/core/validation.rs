use super::error::{FieldError, ValidationErrors};
use super::types::{CorpusInputs, PLAN_END_AGE, SipInputs};

/// Unvalidated corpus projection inputs as collected from a form, query or CLI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorpusDraft {
    pub current_expenses: f64,
    pub current_investment: f64,
    pub expenses_increment_per_year: f64,
    pub expected_rate_of_return: f64,
}

impl Default for CorpusDraft {
    fn default() -> Self {
        Self {
            current_expenses: 1_200_000.0,
            current_investment: 10_000_000.0,
            expenses_increment_per_year: 6.0,
            expected_rate_of_return: 10.0,
        }
    }
}

/// Unvalidated SIP plan inputs. Ages are signed so that nonsense input can be reported
/// instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SipDraft {
    pub current_age: i64,
    pub retirement_age: i64,
    pub annual_expense: f64,
    pub expected_inflation: f64,
    pub expected_return_during_investment: f64,
    pub expected_return_after_retirement: f64,
}

impl Default for SipDraft {
    fn default() -> Self {
        Self {
            current_age: 30,
            retirement_age: 60,
            annual_expense: 1_200_000.0,
            expected_inflation: 6.0,
            expected_return_during_investment: 12.0,
            expected_return_after_retirement: 8.0,
        }
    }
}

pub fn validate_corpus_inputs(draft: &CorpusDraft) -> Result<CorpusInputs, ValidationErrors> {
    let mut errors = Vec::new();
    require_positive(
        &mut errors,
        "currentExpenses",
        "Annual Expenses",
        draft.current_expenses,
    );
    require_positive(
        &mut errors,
        "currentInvestment",
        "Current Investment",
        draft.current_investment,
    );
    require_non_negative(
        &mut errors,
        "expensesIncrementPerYear",
        "Annual Expense Increase",
        draft.expenses_increment_per_year,
    );
    require_non_negative(
        &mut errors,
        "expectedRateOfReturn",
        "Expected Rate of Return",
        draft.expected_rate_of_return,
    );

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    Ok(CorpusInputs {
        current_expenses: draft.current_expenses,
        current_investment: draft.current_investment,
        expenses_increment_per_year: draft.expenses_increment_per_year,
        expected_rate_of_return: draft.expected_rate_of_return,
    })
}

pub fn validate_sip_inputs(draft: &SipDraft) -> Result<SipInputs, ValidationErrors> {
    let mut errors = Vec::new();

    if draft.current_age <= 0 {
        errors.push(FieldError::new(
            "currentAge",
            "Current Age must be greater than 0",
        ));
    }
    if draft.retirement_age <= draft.current_age {
        errors.push(FieldError::new(
            "retirementAge",
            "Retirement Age must be greater than Current Age",
        ));
    } else if draft.retirement_age >= i64::from(PLAN_END_AGE) {
        errors.push(FieldError::new(
            "retirementAge",
            format!("Retirement Age must be less than {PLAN_END_AGE}"),
        ));
    }

    require_positive(
        &mut errors,
        "annualExpense",
        "Annual Expense",
        draft.annual_expense,
    );
    require_non_negative(
        &mut errors,
        "expectedInflation",
        "Expected Inflation",
        draft.expected_inflation,
    );
    require_non_negative(
        &mut errors,
        "expectedReturnDuringInvestment",
        "Expected Return During Investment",
        draft.expected_return_during_investment,
    );
    require_non_negative(
        &mut errors,
        "expectedReturnAfterRetirement",
        "Expected Return After Retirement",
        draft.expected_return_after_retirement,
    );

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    // 0 < current < retirement < PLAN_END_AGE holds here, so both ages fit in u32.
    Ok(SipInputs {
        current_age: draft.current_age as u32,
        retirement_age: draft.retirement_age as u32,
        annual_expense: draft.annual_expense,
        expected_inflation: draft.expected_inflation,
        expected_return_during_investment: draft.expected_return_during_investment,
        expected_return_after_retirement: draft.expected_return_after_retirement,
    })
}

fn require_positive(errors: &mut Vec<FieldError>, field: &'static str, label: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(FieldError::new(
            field,
            format!("{label} must be greater than 0"),
        ));
    }
}

fn require_non_negative(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: f64,
) {
    if !value.is_finite() {
        errors.push(FieldError::new(
            field,
            format!("{label} must be a finite number"),
        ));
    } else if value < 0.0 {
        errors.push(FieldError::new(field, format!("{label} cannot be negative")));
    }
}
