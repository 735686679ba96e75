//! Question request types

use serde::{Deserialize, Deserializer, Serialize};

/// Answering persona selected by the `botType` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    /// General helpful assistant
    #[default]
    Normal,
    /// Career guidance expert
    Career,
    /// Step-by-step math tutor with LaTeX output
    Math,
    /// Any unrecognised mode tag
    General,
}

impl BotMode {
    /// Parse a mode tag; unrecognised tags map to `General`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "normal" => Self::Normal,
            "career" => Self::Career,
            "math" => Self::Math,
            _ => Self::General,
        }
    }

    /// Mode tag as sent by clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Career => "career",
            Self::Math => "math",
            Self::General => "general",
        }
    }
}

impl std::str::FromStr for BotMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

/// Body of `POST /api/chatbot/askdoubt`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The question to answer; `null` reads as blank
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,

    /// Persona tag (default: normal)
    #[serde(default)]
    pub bot_type: Option<String>,

    /// Answer against the indexed documents
    #[serde(default)]
    pub use_context: bool,

    /// Number of chunks to retrieve when `use_context` is set
    #[serde(default)]
    pub top_k: Option<usize>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AskRequest {
    /// Create a new request
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Set the persona tag
    pub fn with_bot_type(mut self, bot_type: impl Into<String>) -> Self {
        self.bot_type = Some(bot_type.into());
        self
    }

    /// Resolved persona
    pub fn mode(&self) -> BotMode {
        self.bot_type
            .as_deref()
            .map(BotMode::from_tag)
            .unwrap_or_default()
    }

    /// Trimmed question, `None` when blank
    pub fn question(&self) -> Option<&str> {
        let q = self.question.trim();
        (!q.is_empty()).then_some(q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tags() {
        assert_eq!(BotMode::from_tag("math"), BotMode::Math);
        assert_eq!(BotMode::from_tag(" Career "), BotMode::Career);
        assert_eq!(BotMode::from_tag("normal"), BotMode::Normal);
        assert_eq!(BotMode::from_tag("poetry"), BotMode::General);
    }

    #[test]
    fn test_request_defaults() {
        let req: AskRequest = serde_json::from_str(r#"{"question": "What is 2+2?"}"#).unwrap();
        assert_eq!(req.mode(), BotMode::Normal);
        assert!(!req.use_context);
        assert_eq!(req.question(), Some("What is 2+2?"));
    }

    #[test]
    fn test_camel_case_fields() {
        let req: AskRequest = serde_json::from_str(
            r#"{"question": "integrate x^2", "botType": "math", "useContext": true, "topK": 3}"#,
        )
        .unwrap();
        assert_eq!(req.mode(), BotMode::Math);
        assert!(req.use_context);
        assert_eq!(req.top_k, Some(3));
    }

    #[test]
    fn test_blank_question() {
        let req: AskRequest = serde_json::from_str(r#"{"botType": "math"}"#).unwrap();
        assert!(req.question().is_none());
        assert!(AskRequest::new("   ").question().is_none());

        let req: AskRequest = serde_json::from_str(r#"{"question": null}"#).unwrap();
        assert!(req.question().is_none());
    }
}
