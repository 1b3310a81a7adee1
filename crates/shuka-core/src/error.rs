//! Error Types

use thiserror::Error;

use crate::settings::Language;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Search backend transport failure
    #[error("Search error: {0}")]
    Search(String),

    /// A network call exceeded the configured wall clock
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// Parse error (e.g., provider response parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Conversation store error
    #[error("Store error: {0}")]
    Store(String),

    /// A turn is already running for this conversation
    #[error("Conversation {0} already has a turn in flight")]
    Busy(String),

    /// Malformed request from the caller
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Configuration errors send the user to the settings screen
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Convert to a user-friendly message in the given UI language
    pub fn user_message(&self, language: Language) -> String {
        match language {
            Language::En => self.user_message_en(),
            Language::Ru => self.user_message_ru(),
        }
    }

    fn user_message_en(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration is incomplete: {msg}. Please open the settings."),
            Self::Provider(msg) => format!("Sorry, the AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => "The AI service is currently unavailable. Please try again.".into(),
            Self::RateLimited(_) => "The AI service quota has been exceeded. Please wait a moment and try again.".into(),
            Self::Auth(_) => "Authentication with the AI service failed. Please check your API key in the settings.".into(),
            Self::Timeout(_) => "The AI service took too long to respond. Please try again.".into(),
            Self::Busy(_) => "Please wait until the current answer is finished.".into(),
            Self::InvalidRequest(msg) => format!("Invalid request: {msg}"),
            _ => "Sorry, an unexpected error occurred.".into(),
        }
    }

    fn user_message_ru(&self) -> String {
        match self {
            Self::Config(msg) => format!("Настройки не заполнены: {msg}. Пожалуйста, откройте настройки."),
            Self::Provider(msg) => format!("Извините, сервис ИИ вернул ошибку: {msg}"),
            Self::ProviderUnavailable(_) => "Сервис ИИ сейчас недоступен. Попробуйте ещё раз.".into(),
            Self::RateLimited(_) => "Квота сервиса ИИ исчерпана. Подождите немного и попробуйте снова.".into(),
            Self::Auth(_) => "Не удалось авторизоваться в сервисе ИИ. Проверьте API-ключ в настройках.".into(),
            Self::Timeout(_) => "Сервис ИИ не ответил вовремя. Попробуйте ещё раз.".into(),
            Self::Busy(_) => "Пожалуйста, дождитесь окончания текущего ответа.".into(),
            Self::InvalidRequest(msg) => format!("Некорректный запрос: {msg}"),
            _ => "Извините, произошла непредвиденная ошибка.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_mentions_quota() {
        let err = AgentError::RateLimited("429".into());
        assert!(err.user_message(Language::En).contains("quota"));
        assert!(err.user_message(Language::Ru).contains("Квота"));
    }

    #[test]
    fn test_config_errors_point_to_settings() {
        let err = AgentError::Config("API key is missing".into());
        assert!(err.is_config());
        assert!(err.user_message(Language::En).contains("settings"));
    }
}
