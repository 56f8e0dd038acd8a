use std::fmt::{self, Write as _};

use clap::{Args, Parser, Subcommand};

use super::currency::{Currency, format_currency, format_number};
use super::{build_corpus_response, build_sip_response};
use crate::core::{
    CorpusDraft, CorpusSummary, CorpusYearRecord, SipDraft, SipPhase, SipPlanResult, SipSummary,
    run_corpus_depletion, run_sip_plan, summarize_corpus, summarize_sip_plan,
    validate_corpus_inputs, validate_sip_inputs,
};

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Retirement corpus drawdown and SIP (monthly contribution) planning projections"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON HTTP API
    Serve {
        #[arg(default_value_t = 8080)]
        port: u16,
    },
    /// Project how long a fixed fund lasts under inflation-growing withdrawals
    Corpus(CorpusArgs),
    /// Solve the monthly SIP needed to fund retirement until age 90
    Sip(SipArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = Currency::Inr)]
    pub currency: Currency,
    #[arg(long, help = "Print the JSON response body instead of a table")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    #[arg(long, default_value_t = 1_200_000.0, help = "First-year expenses")]
    pub current_expenses: f64,
    #[arg(long, default_value_t = 10_000_000.0, help = "Fund at the start")]
    pub current_investment: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual expense increase in percent"
    )]
    pub expenses_increment_per_year: f64,
    #[arg(
        long,
        default_value_t = 10.0,
        help = "Expected annual return in percent"
    )]
    pub expected_rate_of_return: f64,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SipArgs {
    #[arg(long, default_value_t = 30)]
    pub current_age: i64,
    #[arg(long, default_value_t = 60, help = "Must be below 90")]
    pub retirement_age: i64,
    #[arg(
        long,
        default_value_t = 1_200_000.0,
        help = "Expenses in the first retirement year"
    )]
    pub annual_expense: f64,
    #[arg(long, default_value_t = 6.0, help = "Expected inflation in percent")]
    pub expected_inflation: f64,
    #[arg(
        long,
        default_value_t = 12.0,
        help = "Expected annual return while investing, in percent"
    )]
    pub expected_return_during_investment: f64,
    #[arg(
        long,
        default_value_t = 8.0,
        help = "Expected post-tax annual return after retirement, in percent"
    )]
    pub expected_return_after_retirement: f64,
    #[command(flatten)]
    pub output: OutputArgs,
}

impl From<&CorpusArgs> for CorpusDraft {
    fn from(args: &CorpusArgs) -> Self {
        CorpusDraft {
            current_expenses: args.current_expenses,
            current_investment: args.current_investment,
            expenses_increment_per_year: args.expenses_increment_per_year,
            expected_rate_of_return: args.expected_rate_of_return,
        }
    }
}

impl From<&SipArgs> for SipDraft {
    fn from(args: &SipArgs) -> Self {
        SipDraft {
            current_age: args.current_age,
            retirement_age: args.retirement_age,
            annual_expense: args.annual_expense,
            expected_inflation: args.expected_inflation,
            expected_return_during_investment: args.expected_return_during_investment,
            expected_return_after_retirement: args.expected_return_after_retirement,
        }
    }
}

/// Runs the `corpus` subcommand and returns what should be printed.
pub fn run_corpus_command(args: &CorpusArgs) -> Result<String, String> {
    let inputs =
        validate_corpus_inputs(&CorpusDraft::from(args)).map_err(|e| e.to_string())?;
    let records = run_corpus_depletion(&inputs);
    let summary = summarize_corpus(&records);

    if args.output.json {
        let response = build_corpus_response(args.output.currency, summary, records);
        return serde_json::to_string_pretty(&response).map_err(|e| e.to_string());
    }
    render_corpus_report(&summary, &records, args.output.currency).map_err(|e| e.to_string())
}

/// Runs the `sip` subcommand and returns what should be printed.
pub fn run_sip_command(args: &SipArgs) -> Result<String, String> {
    let inputs =
        validate_sip_inputs(&SipDraft::from(args)).map_err(|e| e.to_string())?;
    let plan = run_sip_plan(&inputs);
    let summary = summarize_sip_plan(&inputs, &plan);

    if args.output.json {
        let response = build_sip_response(args.output.currency, summary, plan);
        return serde_json::to_string_pretty(&response).map_err(|e| e.to_string());
    }
    render_sip_report(&summary, &plan, args.output.currency).map_err(|e| e.to_string())
}

fn render_corpus_report(
    summary: &CorpusSummary,
    records: &[CorpusYearRecord],
    currency: Currency,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Currency:            {} ({})",
        currency.code(),
        currency.locale()
    )?;
    writeln!(out, "Years of retirement: {}", summary.years_lasted)?;
    writeln!(
        out,
        "Final balance:       {}",
        format_currency(summary.final_balance, currency)
    )?;
    if !summary.depleted {
        writeln!(
            out,
            "Balance never depletes within {} years.",
            summary.years_lasted
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{:>4}  {:>20}  {:>20}  {:>20}  {:>20}",
        "Year", "Start Balance", "Withdrawal", "Interest Earned", "End Balance"
    )?;
    for record in records {
        writeln!(
            out,
            "{:>4}  {:>20}  {:>20}  {:>20}  {:>20}",
            record.year,
            format_currency(record.start_balance, currency),
            format_currency(record.withdrawal, currency),
            format_currency(record.interest_earned, currency),
            format_currency(record.end_balance, currency),
        )?;
    }
    Ok(out)
}

fn render_sip_report(
    summary: &SipSummary,
    plan: &SipPlanResult,
    currency: Currency,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "Currency:            {} ({})",
        currency.code(),
        currency.locale()
    )?;
    writeln!(
        out,
        "Required corpus:     {}",
        format_currency(plan.required_corpus, currency)
    )?;
    writeln!(
        out,
        "Monthly SIP needed:  {}",
        format_currency(plan.monthly_sip, currency)
    )?;
    writeln!(
        out,
        "Years to retirement: {}",
        format_number(summary.years_to_retirement.into(), currency)
    )?;
    writeln!(
        out,
        "Retirement duration: {}",
        format_number(summary.retirement_duration.into(), currency)
    )?;
    writeln!(
        out,
        "Final corpus:        {}",
        format_currency(summary.final_corpus, currency)
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "{:>4}  {:>3}  {:<12}  {:>18}  {:>20}  {:>20}  {:>20}",
        "Year", "Age", "Phase", "Monthly SIP", "Withdrawal", "Interest Earned", "End Corpus"
    )?;
    for record in &plan.year_records {
        let phase = match record.phase {
            SipPhase::Accumulation => "accumulation",
            SipPhase::Withdrawal => "withdrawal",
        };
        writeln!(
            out,
            "{:>4}  {:>3}  {:<12}  {:>18}  {:>20}  {:>20}  {:>20}",
            record.year,
            record.age,
            phase,
            format_currency(record.monthly_investment, currency),
            format_currency(record.withdrawal, currency),
            format_currency(record.interest_earned, currency),
            format_currency(record.end_corpus, currency),
        )?;
    }
    Ok(out)
}
