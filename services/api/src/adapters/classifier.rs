//! services/api/src/adapters/classifier.rs
//!
//! `CategoryClassifier` implementations: an OpenAI chat completion and a
//! keyword table used when no API key is configured or the model fails.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use duotrack_core::domain::Category;
use duotrack_core::ports::{CategoryClassifier, PortError, PortResult};

const SYSTEM_PROMPT: &str = "You sort to-do items into categories. The categories are \
Work, Personal, Workout, Study and Other. Respond with ONLY the category name, no \
punctuation, no explanation.";

pub struct OpenAiCategoryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCategoryAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the two-message prompt for one piece of text.
    fn build_request(&self, text: &str) -> PortResult<CreateChatCompletionRequest> {
        let preview = text.chars().take(500).collect::<String>();

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(format!("Categorize this task: {}", preview))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .max_tokens(5u32)
            .temperature(0.0)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(request)
    }
}

#[async_trait]
impl CategoryClassifier for OpenAiCategoryAdapter {
    async fn classify(&self, text: &str) -> PortResult<Category> {
        let request = self.build_request(text)?;
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("No category generated".to_string()))?;

        let cleaned = answer.trim().trim_matches(|c: char| !c.is_alphanumeric());
        Category::parse(cleaned).ok_or_else(|| {
            PortError::Unexpected(format!("Model answered with unknown category '{}'", cleaned))
        })
    }
}

//=========================================================================================
// Keyword fallback
//=========================================================================================

const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Workout,
        &["gym", "run", "workout", "yoga", "lift", "swim", "cardio", "stretch", "walk", "bike"],
    ),
    (
        Category::Study,
        &["study", "read", "exam", "homework", "lecture", "course", "learn", "revise", "essay"],
    ),
    (
        Category::Work,
        &["meeting", "report", "email", "client", "deadline", "project", "review", "deploy", "call"],
    ),
    (
        Category::Personal,
        &["groceries", "clean", "laundry", "cook", "doctor", "dentist", "birthday", "family", "pay"],
    ),
];

/// Picks the first category with a keyword matching a whole word of `text`.
pub fn keyword_category(text: &str) -> Category {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            words
                .iter()
                .any(|word| keywords.iter().any(|k| word.starts_with(k)))
        })
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCategoryAdapter;

#[async_trait]
impl CategoryClassifier for KeywordCategoryAdapter {
    async fn classify(&self, text: &str) -> PortResult<Category> {
        Ok(keyword_category(text))
    }
}
