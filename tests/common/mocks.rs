use async_trait::async_trait;
use logic_lens::{Error, Result, imaging::ImagePart, model::ModelClient};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A recorded call to the mock model.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image: ImagePart,
}

/// Mock model client for testing
#[derive(Debug, Clone)]
pub struct MockModelClient {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub error: Option<String>,
    pub delay: Option<Duration>,
    /// Returned once `responses` runs out.
    pub fallback: Option<String>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            error: None,
            delay: None,
            fallback: None,
        }
    }

    /// Answers every call with the same text.
    pub fn always(text: &str) -> Self {
        let mut mock = Self::new();
        mock.fallback = Some(text.to_string());
        mock
    }

    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        *self.responses.lock().unwrap() = responses.into_iter().map(String::from).collect();
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str, image: &ImagePart) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            image: image.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref error) = self.error {
            return Err(Error::model(error.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return self
                .fallback
                .clone()
                .ok_or_else(|| Error::model("No more mock responses available"));
        }

        Ok(responses.remove(0))
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}
