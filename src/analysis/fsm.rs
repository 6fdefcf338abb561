use crate::{Error, Result, limiter::LimitScope};
use axum::http::StatusCode;
use tracing::{debug, info, warn};

// Analysis states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Received,
    Admitted,
    Normalizing,
    Prompting,
    Generating,
    Parsing,
    Responding,
    Success,
    PartialSuccess,
    RateLimited(LimitScope),
    InvalidInput,
    UpstreamFailure,
}

// Analysis events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisEvent {
    Admit,
    Reject(LimitScope),
    RequestValidated,
    InputRejected,
    ImageNormalized,
    PromptBuilt,
    ModelResponded,
    UpstreamFailed,
    OutputDecoded,
    Structured,
    Degraded,
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::PartialSuccess
                | Self::RateLimited(_)
                | Self::InvalidInput
                | Self::UpstreamFailure
        )
    }

    /// HTTP status for a terminal state, `None` while the request is in flight.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Success | Self::PartialSuccess => Some(StatusCode::OK),
            Self::RateLimited(LimitScope::Global) => Some(StatusCode::SERVICE_UNAVAILABLE),
            Self::RateLimited(LimitScope::PerClient) => Some(StatusCode::TOO_MANY_REQUESTS),
            Self::InvalidInput => Some(StatusCode::BAD_REQUEST),
            Self::UpstreamFailure => Some(StatusCode::INTERNAL_SERVER_ERROR),
            _ => None,
        }
    }
}

/// Tracks one request through the pipeline. Nothing is retried: every
/// terminal state is final.
pub struct AnalysisStateMachine {
    state: AnalysisState,
    request_id: String,
}

impl AnalysisStateMachine {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            state: AnalysisState::Received,
            request_id: request_id.into(),
        }
    }

    pub fn current_state(&self) -> AnalysisState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn transition(&mut self, event: AnalysisEvent) -> Result<AnalysisState> {
        use AnalysisEvent as E;
        use AnalysisState as S;

        let old_state = self.state;
        let new_state = match (old_state, event) {
            (S::Received, E::Admit) => S::Admitted,
            (S::Received, E::Reject(scope)) => S::RateLimited(scope),
            (S::Admitted, E::RequestValidated) => S::Normalizing,
            (S::Admitted, E::InputRejected) => S::InvalidInput,
            (S::Normalizing, E::ImageNormalized) => S::Prompting,
            (S::Normalizing, E::InputRejected) => S::InvalidInput,
            (S::Prompting, E::PromptBuilt) => S::Generating,
            (S::Generating, E::ModelResponded) => S::Parsing,
            (S::Generating, E::UpstreamFailed) => S::UpstreamFailure,
            (S::Parsing, E::OutputDecoded) => S::Responding,
            (S::Responding, E::Structured) => S::Success,
            (S::Responding, E::Degraded) => S::PartialSuccess,
            // Blocking-pool or encoder faults while normalising are server-side.
            (S::Normalizing, E::UpstreamFailed) => S::UpstreamFailure,
            _ => {
                warn!(
                    "Invalid analysis transition from {:?} with event {:?} (request {})",
                    old_state, event, self.request_id
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", old_state),
                    requested: format!("{:?}", event),
                });
            }
        };

        if new_state.is_terminal() {
            info!(
                "Request {} finished: {:?} -> {:?} (event: {:?})",
                self.request_id, old_state, new_state, event
            );
        } else {
            debug!(
                "Request {} state transition: {:?} -> {:?} (event: {:?})",
                self.request_id, old_state, new_state, event
            );
        }

        self.state = new_state;
        Ok(new_state)
    }
}
