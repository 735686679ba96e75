//! Answer generation with prompt templates and citation handling

pub mod answer;
pub mod citation;
pub mod prompt;

pub use answer::AnswerGenerator;
pub use citation::{citations_from, truncate_snippet};
pub use prompt::PromptBuilder;
pub use crate::types::BotMode;
