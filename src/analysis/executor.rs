use super::{
    fsm::{AnalysisEvent, AnalysisState, AnalysisStateMachine},
    parser::parse_analysis,
    prompt::build_prompt,
    types::{AnalyzeRequest, ApiResponse},
};
use crate::{
    Error, Result,
    imaging::{self, ImagePart},
    limiter::{LimitScope, RateLimiter, Rejection},
    model::ModelClient,
};
use axum::http::StatusCode;
use std::{sync::Arc, time::Duration};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

pub const MISSING_IMAGE_MESSAGE: &str = "Missing required data";
pub const MISSING_IMAGE_ERROR: &str = "No image data provided";
pub const GLOBAL_LIMIT_MESSAGE: &str = "Too many requests: Server Busy, We are serving at max";
pub const UPSTREAM_FAILURE_ERROR: &str = "Failed to process image";

/// Final state of one request plus the body to send back.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub request_id: String,
    pub state: AnalysisState,
    pub response: ApiResponse,
    /// Window length of the gate that rejected the request, if any.
    pub retry_after: Option<Duration>,
}

impl AnalysisOutcome {
    pub fn status_code(&self) -> StatusCode {
        self.state
            .status_code()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Runs admission, normalisation, prompting, the model call and parsing for
/// each request. Shared across request tasks; only the limiter is mutable.
pub struct Analyzer {
    limiter: Arc<RateLimiter>,
    model: Arc<dyn ModelClient>,
    model_timeout: Option<Duration>,
}

impl Analyzer {
    pub fn new(
        limiter: Arc<RateLimiter>,
        model: Arc<dyn ModelClient>,
        model_timeout: Option<Duration>,
    ) -> Self {
        info!(
            "Analyzer ready with {} model client (timeout: {:?})",
            model.name(),
            model_timeout
        );
        Self {
            limiter,
            model,
            model_timeout,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// `body` is the decoded request, or the reason it could not be decoded.
    /// Admission is checked before the body is looked at.
    pub async fn analyze(
        &self,
        client: &str,
        body: std::result::Result<AnalyzeRequest, String>,
    ) -> AnalysisOutcome {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("analyze", request_id = %request_id, client = %client);
        self.run(request_id, client, body).instrument(span).await
    }

    async fn run(
        &self,
        request_id: String,
        client: &str,
        body: std::result::Result<AnalyzeRequest, String>,
    ) -> AnalysisOutcome {
        let mut fsm = AnalysisStateMachine::new(request_id.clone());

        if let Err(rejection) = self.limiter.admit(client) {
            let state = step(&mut fsm, AnalysisEvent::Reject(rejection.scope));
            return AnalysisOutcome {
                request_id,
                state,
                response: rejection_response(&rejection),
                retry_after: Some(rejection.window),
            };
        }
        step(&mut fsm, AnalysisEvent::Admit);

        let request = match body {
            Ok(request) => request,
            Err(reason) => {
                warn!("Rejecting malformed request body: {}", reason);
                return finish(
                    request_id,
                    step(&mut fsm, AnalysisEvent::InputRejected),
                    ApiResponse::error("Invalid request body", Some(reason)),
                );
            }
        };

        let Some(image_data) = request.image_data.filter(|data| !data.is_empty()) else {
            warn!("Request carried no image data");
            return finish(
                request_id,
                step(&mut fsm, AnalysisEvent::InputRejected),
                ApiResponse::error(MISSING_IMAGE_MESSAGE, Some(MISSING_IMAGE_ERROR.to_string())),
            );
        };
        step(&mut fsm, AnalysisEvent::RequestValidated);

        let image = match normalize_off_runtime(image_data).await {
            Ok(image) => image,
            Err(Error::InvalidImage(reason)) => {
                warn!("Image rejected: {}", reason);
                return finish(
                    request_id,
                    step(&mut fsm, AnalysisEvent::InputRejected),
                    ApiResponse::error("Invalid image data", Some(reason)),
                );
            }
            Err(e) => {
                error!("Image normalization failed: {}", e);
                return finish(
                    request_id,
                    step(&mut fsm, AnalysisEvent::UpstreamFailed),
                    ApiResponse::error(e.to_string(), Some(UPSTREAM_FAILURE_ERROR.to_string())),
                );
            }
        };
        step(&mut fsm, AnalysisEvent::ImageNormalized);

        let prompt = build_prompt(&request.variables);
        step(&mut fsm, AnalysisEvent::PromptBuilt);

        let text = match self.generate(&prompt, &image).await {
            Ok(text) => text,
            Err(e) => {
                error!("Model call failed: {}", e);
                return finish(
                    request_id,
                    step(&mut fsm, AnalysisEvent::UpstreamFailed),
                    ApiResponse::error(e.to_string(), Some(UPSTREAM_FAILURE_ERROR.to_string())),
                );
            }
        };
        drop(image);
        step(&mut fsm, AnalysisEvent::ModelResponded);

        let parsed = parse_analysis(&text);
        step(&mut fsm, AnalysisEvent::OutputDecoded);

        if parsed.success {
            finish(
                request_id,
                step(&mut fsm, AnalysisEvent::Structured),
                ApiResponse::success(parsed.result),
            )
        } else {
            finish(
                request_id,
                step(&mut fsm, AnalysisEvent::Degraded),
                ApiResponse::partial_success(parsed.result),
            )
        }
    }

    async fn generate(&self, prompt: &str, image: &ImagePart) -> Result<String> {
        debug!("Dispatching to {} model client", self.model.name());
        match self.model_timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.generate(prompt, image))
                .await
                .map_err(|_| Error::ModelTimeout { limit })?,
            None => self.model.generate(prompt, image).await,
        }
    }
}

async fn normalize_off_runtime(image_data: String) -> Result<ImagePart> {
    tokio::task::spawn_blocking(move || imaging::normalize(&image_data))
        .await
        .map_err(|e| Error::internal(format!("image normalization task failed: {}", e)))?
}

fn rejection_response(rejection: &Rejection) -> ApiResponse {
    match rejection.scope {
        LimitScope::Global => ApiResponse::error(GLOBAL_LIMIT_MESSAGE, None),
        LimitScope::PerClient => ApiResponse::error(per_client_limit_message(rejection), None),
    }
}

pub fn per_client_limit_message(rejection: &Rejection) -> String {
    let (span, period) = match rejection.window.as_secs() {
        60 => ("a minute".to_string(), "minute".to_string()),
        secs => (format!("{} seconds", secs), format!("{} seconds", secs)),
    };
    format!(
        "Too many requests in {}, You can make a maximum of {} requests per {}",
        span, rejection.limit, period
    )
}

// The pipeline only ever fires transitions that exist, so a failure here is a bug.
fn step(fsm: &mut AnalysisStateMachine, event: AnalysisEvent) -> AnalysisState {
    match fsm.transition(event) {
        Ok(state) => state,
        Err(e) => {
            error!("{}", e);
            fsm.current_state()
        }
    }
}

fn finish(request_id: String, state: AnalysisState, response: ApiResponse) -> AnalysisOutcome {
    AnalysisOutcome {
        request_id,
        state,
        response,
        retry_after: None,
    }
}
