use super::{GeminiClient, OpenAiClient};
use crate::{
    Result,
    config::{ModelConfig, ModelProvider},
    imaging::ImagePart,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// The generative model as seen by the pipeline: one prompt and one image in,
/// free text out. Implementations never retry and impose no timeout.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, image: &ImagePart) -> Result<String>;
}

pub fn create_model_client(config: &ModelConfig) -> Result<Arc<dyn ModelClient>> {
    info!(
        "Creating {:?} model client for model {}",
        config.provider, config.model
    );
    let client: Arc<dyn ModelClient> = match config.provider {
        ModelProvider::Gemini => Arc::new(GeminiClient::new(config)?),
        ModelProvider::Openai => Arc::new(OpenAiClient::new(config)),
    };
    Ok(client)
}
