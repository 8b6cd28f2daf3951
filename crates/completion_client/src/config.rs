/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service, without a trailing slash.
    pub api_base: String,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.api_base)
    }

    pub fn models_url(&self) -> String {
        format!("{}/api/models", self.api_base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}
