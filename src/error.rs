use colored::Colorize;
use std::fmt;

/// Errors raised while declaring schemas or validating configuration values
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value could not be coerced into the field's type or broke a constraint
    Validation { key: String, message: String },
    /// The schema or a field was misused (bad declaration, read-only slot, rebinding)
    Type { key: String, message: String },
    /// A value offered to a schema-typed slot is neither a config of that schema nor a mapping
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },
    /// A list position is outside of the list
    IndexOutOfRange { index: usize, len: usize },
    /// A value looked up in a list is not present
    NotInList { value: String },
    /// The name is not declared in the schema
    UnknownKey { key: String },
    /// The config that owns a list or method has been dropped
    Detached,
    /// An environment variable has an invalid value
    InvalidEnvironment {
        key: String,
        value: String,
        description: String,
        example: Option<String>,
    },
    /// Encoding or decoding of a serialized document failed
    Format { message: String },
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn type_error(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Type {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors caused by a rejected value
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConfigError::Validation { .. }
                | ConfigError::TypeMismatch { .. }
                | ConfigError::InvalidEnvironment { .. }
        )
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Validation { key, message } => {
                write!(f, "{}: {}", key.magenta().bold(), message)
            }
            ConfigError::Type { key, message } => {
                write!(f, "{}: {}", key.magenta().bold(), message.red())
            }
            ConfigError::TypeMismatch {
                key,
                expected,
                found,
            } => write!(
                f,
                "{}: expected {}, found {}",
                key.magenta().bold(),
                expected.cyan(),
                found.red()
            ),
            ConfigError::IndexOutOfRange { index, len } => write!(
                f,
                "list index {} out of range for length {}",
                index.to_string().red(),
                len
            ),
            ConfigError::NotInList { value } => {
                write!(f, "{} is not in list", format!("'{}'", value).red())
            }
            ConfigError::UnknownKey { key } => {
                write!(f, "{}: is not declared in the schema", key.magenta().bold())
            }
            ConfigError::Detached => write!(f, "the owning config no longer exists"),
            ConfigError::InvalidEnvironment {
                key,
                value,
                description,
                example,
            } => {
                writeln!(
                    f,
                    "{}: Invalid value {}",
                    key.magenta().bold(),
                    format!("'{}'", value).red(),
                )?;
                writeln!(f, "\tDescription: {}", description)?;
                if let Some(ex) = example {
                    writeln!(f, "\tExample: {}={}", key.magenta().bold(), ex.cyan())?;
                }
                Ok(())
            }
            ConfigError::Format { message } => write!(f, "format error: {}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Helper to format multiple configuration errors into a single report
pub fn format_config_errors(errors: &[ConfigError]) -> String {
    let error_summary = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Configuration failed with {} error(s):\n{}",
        errors.len().to_string().yellow().bold(),
        error_summary
    )
}
