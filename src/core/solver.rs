use super::types::PLAN_END_AGE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionSolution {
    pub monthly_sip: f64,
    pub monthly_rate: f64,
    pub months_to_retirement: u32,
}

/// Corpus needed at `retirement_age` to fund inflation-growing withdrawals until the plan
/// end age, discounting each year's expense by one full period more than its index.
///
/// Summed year by year so that equal return and inflation rates need no special case.
pub fn required_corpus(
    retirement_age: u32,
    annual_expense: f64,
    expected_inflation: f64,
    expected_return_after_retirement: f64,
) -> f64 {
    let years_in_retirement = PLAN_END_AGE.saturating_sub(retirement_age);
    let post_retirement_rate = expected_return_after_retirement / 100.0;
    let inflation_rate = expected_inflation / 100.0;

    let mut corpus = 0.0;
    let mut expense = annual_expense;
    for year in 0..years_in_retirement {
        let discount_factor = (1.0 + post_retirement_rate).powi(year as i32 + 1);
        corpus += expense / discount_factor;
        expense *= 1.0 + inflation_rate;
    }
    corpus
}

/// Level monthly contribution whose future value, paid at the start of each month, reaches
/// `target_corpus` after `years_to_retirement` years.
///
/// The trailing `(1 + r)` in the denominator matches the accumulation loop, which adds the
/// contribution before compounding each month.
pub fn solve_monthly_contribution(
    target_corpus: f64,
    years_to_retirement: u32,
    expected_return_during_investment: f64,
) -> ContributionSolution {
    let monthly_rate = expected_return_during_investment / 100.0 / 12.0;
    let months_to_retirement = years_to_retirement * 12;

    let monthly_sip = if months_to_retirement == 0 {
        0.0
    } else if monthly_rate == 0.0 {
        target_corpus / months_to_retirement as f64
    } else {
        let growth = (1.0 + monthly_rate).powi(months_to_retirement as i32);
        target_corpus * monthly_rate / ((growth - 1.0) * (1.0 + monthly_rate))
    };

    ContributionSolution {
        monthly_sip,
        monthly_rate,
        months_to_retirement,
    }
}
