use thiserror::Error;

pub const APP_NAME: &str = "booking_planner";
pub const USER_ID: &str = "user1234";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_STEPS: usize = 25;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_KEY environment variable is not set")]
    MissingApiKey,
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoConfig {
    pub model: String,
    pub max_steps: usize,
}

impl DemoConfig {
    /// Reads the process environment after loading `.env`, if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(error) = dotenvy::dotenv() {
            if !error.not_found() {
                tracing::warn!(%error, "ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let has_key = lookup("API_KEY").is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(ConfigError::MissingApiKey);
        }

        let model = lookup("MODEL_NAME")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_steps = match lookup("MAX_STEPS") {
            Some(raw) => parse_max_steps(&raw)?,
            None => DEFAULT_MAX_STEPS,
        };

        Ok(Self { model, max_steps })
    }
}

pub fn parse_max_steps(raw: &str) -> Result<usize, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        name: "MAX_STEPS".to_string(),
        message,
    };
    let value: usize = raw.trim().parse().map_err(|error| invalid(format!("{error}")))?;
    if value == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(value)
}
