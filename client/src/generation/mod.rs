//! Generation provider abstraction.
//!
//! This module defines the `GenerationProvider` trait that abstracts the
//! external text-generation service behind the one call the workspace
//! needs, plus the prompt composition applied to every request.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use contentflow_common::{ContentType, Tone};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Generation provider error: {0}")]
    Provider(String),
}

/// Parameters of one generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub content_type: ContentType,
    pub topic: String,
    pub tone: Tone,
}

/// Primary trait for text-generation providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce content for the request, returning the full generated text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Build the prompt sent to the provider for a request.
pub fn compose_prompt(request: &GenerationRequest) -> String {
    format!(
        "Act as a professional content creator.\n\
         Generate a {} about the topic: \"{}\".\n\
         Tone: {}.\n\
         Format the output clearly with headings if necessary.\n\
         Do not include conversational filler like \"Here is your content\".",
        request.content_type, request.topic, request.tone
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_type_topic_and_tone() {
        let prompt = compose_prompt(&GenerationRequest {
            content_type: ContentType::ColdEmail,
            topic: "warm intro to a CTO".to_string(),
            tone: Tone::Witty,
        });
        assert!(prompt.contains("Generate a Cold Email"));
        assert!(prompt.contains("\"warm intro to a CTO\""));
        assert!(prompt.contains("Tone: Witty."));
    }
}
