use super::types::AnalysisResult;
use tracing::{debug, warn};

/// Outcome of decoding model text. `success == false` means `result` is the raw fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnalysis {
    pub success: bool,
    pub result: AnalysisResult,
}

/// Decodes model output into one of the typed result shapes.
///
/// Anything that is not a JSON object matching a known `type` and its field
/// shapes degrades to `raw_response` carrying the untouched text.
pub fn parse_analysis(text: &str) -> ParsedAnalysis {
    let candidate = strip_code_fence(text.trim());
    match serde_json::from_str::<AnalysisResult>(candidate) {
        Ok(result) => {
            debug!("Model output parsed as {}", result.kind());
            ParsedAnalysis {
                success: true,
                result,
            }
        }
        Err(e) => {
            warn!("Model output did not match any result schema: {}", e);
            ParsedAnalysis {
                success: false,
                result: AnalysisResult::raw(text),
            }
        }
    }
}

// Models sometimes wrap the object in ```json ... ``` despite being told not to.
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
