mod engine;
mod error;
mod solver;
mod types;
mod validation;

pub use engine::{run_corpus_depletion, run_sip_plan, summarize_corpus, summarize_sip_plan};
pub use error::{FieldError, ValidationErrors};
pub use solver::{ContributionSolution, required_corpus, solve_monthly_contribution};
pub use types::{
    CorpusInputs, CorpusSummary, CorpusYearRecord, MAX_PROJECTION_YEARS, PLAN_END_AGE,
    SipInputs, SipPhase, SipPlanResult, SipSummary, SipYearRecord,
};
pub use validation::{CorpusDraft, SipDraft, validate_corpus_inputs, validate_sip_inputs};
