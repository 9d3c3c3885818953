use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A raw event could not be turned into a [`crate::SensorEvent`].
    #[error("Parse error at event #{index}: {message}")]
    Parse { index: usize, message: String },

    /// A detection config violated one of its consistency rules.
    #[error("Configuration error in `{field}`: {message}")]
    Configuration { field: String, message: String },

    /// An evaluation period too short to hold the days it is scored over.
    #[error("Evaluation period of {total_days} days is shorter than the {observed} days observed")]
    Period { total_days: u32, observed: u32 },
}

impl CareError {
    pub fn parse(index: usize, message: impl Into<String>) -> Self {
        CareError::Parse {
            index,
            message: message.into(),
        }
    }

    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        CareError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result alias for carewatch operations.
pub type Result<T> = std::result::Result<T, CareError>;
