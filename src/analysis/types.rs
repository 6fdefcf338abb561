use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Substitution hints forwarded to the model. Sorted so serialisation is stable.
pub type Variables = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub variables: Variables,
}

/// One answer shape per problem family, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisResult {
    BooleanSimplification {
        original: String,
        result: String,
    },
    LogicExpression {
        expr: String,
        result: String,
    },
    CodeConversion {
        input_type: String,
        output_type: String,
        input: String,
        result: String,
    },
    Kmap {
        variables: Vec<String>,
        minimized_sop: String,
        minimized_pos: String,
        expression_type: String,
    },
    BinaryArithmetic {
        operation: String,
        operand1: String,
        operand2: String,
        result: String,
    },
    RawResponse {
        result: String,
    },
}

impl AnalysisResult {
    pub fn raw(text: impl Into<String>) -> Self {
        Self::RawResponse {
            result: text.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BooleanSimplification { .. } => "boolean_simplification",
            Self::LogicExpression { .. } => "logic_expression",
            Self::CodeConversion { .. } => "code_conversion",
            Self::Kmap { .. } => "kmap",
            Self::BinaryArithmetic { .. } => "binary_arithmetic",
            Self::RawResponse { .. } => "raw_response",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    PartialSuccess,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<AnalysisResult>,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn success(result: AnalysisResult) -> Self {
        Self {
            message: "Image processed".to_string(),
            data: vec![result],
            status: ResponseStatus::Success,
            error: None,
        }
    }

    pub fn partial_success(result: AnalysisResult) -> Self {
        Self {
            message: "Image processed but response format error".to_string(),
            data: vec![result],
            status: ResponseStatus::PartialSuccess,
            error: None,
        }
    }

    /// Error envelope. `error` is only set when there is detail beyond `message`.
    pub fn error(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            message: message.into(),
            data: Vec::new(),
            status: ResponseStatus::Error,
            error,
        }
    }
}
