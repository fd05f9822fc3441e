use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Cannot encode value as {expected}: {value}")]
    Encoding { expected: String, value: String },

    #[error("Cannot decode '{raw}' as {expected}: {reason}")]
    Decoding {
        raw: String,
        expected: String,
        reason: String,
    },

    #[error("Can't parse property condition: {0}")]
    MalformedCondition(String),

    #[error("Unknown condition type: {0}")]
    UnknownConditionType(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Configuration already registered: {0}")]
    DuplicateConfiguration(String),

    #[error("Unknown configuration: {0}")]
    UnknownConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Definition error: {0}")]
    Definition(String),
}

impl FilterError {
    pub(crate) fn decoding(
        raw: impl Into<String>,
        expected: impl ToString,
        reason: impl ToString,
    ) -> Self {
        FilterError::Decoding {
            raw: raw.into(),
            expected: expected.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that only affect a single condition token and may be
    /// dropped without aborting the batch.
    pub fn is_token_local(&self) -> bool {
        matches!(
            self,
            FilterError::MalformedCondition(_)
                | FilterError::UnknownConditionType(_)
                | FilterError::UnknownOperation(_)
                | FilterError::Decoding { .. }
        )
    }
}

impl From<confique::Error> for FilterError {
    fn from(e: confique::Error) -> Self {
        FilterError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
