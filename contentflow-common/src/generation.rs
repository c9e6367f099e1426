use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The fixed set of content formats the product can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "Blog Post")]
    BlogPost,
    #[serde(rename = "Twitter Thread")]
    TwitterThread,
    #[serde(rename = "Cold Email")]
    ColdEmail,
    #[serde(rename = "LinkedIn Post")]
    LinkedInPost,
}

impl ContentType {
    /// All content types, in display order.
    pub fn all() -> [ContentType; 4] {
        [
            ContentType::BlogPost,
            ContentType::TwitterThread,
            ContentType::ColdEmail,
            ContentType::LinkedInPost,
        ]
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ContentType::BlogPost => "Blog Post",
            ContentType::TwitterThread => "Twitter Thread",
            ContentType::ColdEmail => "Cold Email",
            ContentType::LinkedInPost => "LinkedIn Post",
        };
        write!(f, "{}", label)
    }
}

/// Writing tone applied to a generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Enthusiastic,
    Witty,
    Urgent,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Tone::Professional => "Professional",
            Tone::Casual => "Casual",
            Tone::Enthusiastic => "Enthusiastic",
            Tone::Witty => "Witty",
            Tone::Urgent => "Urgent",
        };
        write!(f, "{}", label)
    }
}

/// One completed generation.
///
/// Created only on success, prepended newest-first to the in-memory
/// history, and never mutated afterwards. The id is time-based and unique
/// within the process only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationHistory {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: String,
    pub content: String,
    /// Creation timestamp, ISO-8601.
    pub date: String,
}

impl GenerationHistory {
    pub fn new(content_type: ContentType, topic: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            content_type,
            topic,
            content,
            date: now.to_rfc3339(),
        }
    }
}

/// Number of whitespace-separated words in a piece of content.
pub fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}
