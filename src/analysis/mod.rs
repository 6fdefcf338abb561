mod executor;
pub mod fsm;
pub mod parser;
pub mod prompt;
pub mod types;

pub use executor::{
    AnalysisOutcome, Analyzer, GLOBAL_LIMIT_MESSAGE, MISSING_IMAGE_ERROR, MISSING_IMAGE_MESSAGE,
    UPSTREAM_FAILURE_ERROR, per_client_limit_message,
};
pub use fsm::{AnalysisEvent, AnalysisState, AnalysisStateMachine};
pub use parser::{ParsedAnalysis, parse_analysis};
pub use prompt::build_prompt;
pub use types::{AnalysisResult, AnalyzeRequest, ApiResponse, ResponseStatus, Variables};
