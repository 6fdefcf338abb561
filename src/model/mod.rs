mod client;
mod gemini;
mod openai;
pub mod types;

pub use client::{ModelClient, create_model_client};
pub use gemini::{GeminiClient, response_text};
pub use openai::OpenAiClient;
