use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::fields::VirtualField;
use crate::schema::Schema;
use crate::value::{FieldValue, Value};
use regex::Regex;

/// Case transform applied before any check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Lower,
    Upper,
}

/// Strip transform applied before any check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strip {
    Whitespace,
    /// Strip any of these characters from both ends
    Chars(String),
}

/// Default log levels accepted by [`StringField::log_level`]
pub const LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "critical"];

/// Default application modes
pub const DEFAULT_MODES: &[&str] = &["development", "production"];

/// Reads the string out of a value or reports the field as not a string
pub(crate) fn expect_str<'v>(name: &str, value: &'v FieldValue) -> Result<&'v str, ConfigError> {
    value
        .as_str()
        .ok_or_else(|| ConfigError::validation(name, "is not a valid string"))
}

#[derive(Debug, Clone, Default)]
struct StringRules {
    min_len: Option<usize>,
    max_len: Option<usize>,
    regex: Option<Regex>,
    choices: Option<Vec<String>>,
    case: Option<Case>,
    strip: Option<Strip>,
}

impl StringRules {
    fn apply(&self, name: &str, value: &str) -> Result<String, ConfigError> {
        let value = match &self.strip {
            Some(Strip::Whitespace) => value.trim(),
            Some(Strip::Chars(chars)) => value.trim_matches(|c| chars.contains(c)),
            None => value,
        };
        let value = match self.case {
            Some(Case::Lower) => value.to_lowercase(),
            Some(Case::Upper) => value.to_uppercase(),
            None => value.to_string(),
        };

        let len = value.chars().count();
        if let Some(min) = self.min_len {
            if len < min {
                return Err(ConfigError::validation(
                    name,
                    format!("must be at least {} characters", min),
                ));
            }
        }
        if let Some(max) = self.max_len {
            if len > max {
                return Err(ConfigError::validation(
                    name,
                    format!("must not be more than {} characters", max),
                ));
            }
        }
        if let Some(regex) = &self.regex {
            // Matches must start at the beginning of the value.
            if !regex.find(&value).is_some_and(|m| m.start() == 0) {
                return Err(ConfigError::validation(
                    name,
                    format!("does not match pattern {}", regex.as_str()),
                ));
            }
        }
        if let Some(choices) = &self.choices {
            if !choices.iter().any(|choice| *choice == value) {
                return Err(ConfigError::validation(name, "is not a valid choice"));
            }
        }
        Ok(value)
    }
}

/// String field with optional transforms and checks
///
/// Transforms run first (strip, then case), then length, pattern and choice checks.
#[derive(Debug, Clone)]
pub struct StringField {
    base: FieldBase,
    rules: StringRules,
}

impl StringField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            rules: StringRules::default(),
        }
    }

    /// Log level name, lower-cased and stripped, one of [`LOG_LEVELS`]
    pub fn log_level() -> Self {
        Self::new()
            .choices(LOG_LEVELS.iter().copied())
            .case(Case::Lower)
            .strip(Strip::Whitespace)
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.rules.min_len = Some(min);
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.rules.max_len = Some(max);
        self
    }

    /// Pattern the value must match from its first character
    pub fn regex(mut self, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern)
            .map_err(|e| ConfigError::type_error(self.base.name(), format!("invalid regex: {}", e)))?;
        self.rules.regex = Some(regex);
        Ok(self)
    }

    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn case(mut self, case: Case) -> Self {
        self.rules.case = Some(case);
        self
    }

    pub fn strip(mut self, strip: Strip) -> Self {
        self.rules.strip = Some(strip);
        self
    }
}

impl Field for StringField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "string".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        let text = self.rules.apply(self.name(), text)?;
        Ok(FieldValue::Basic(Value::String(text)))
    }
}

/// Application operating mode
///
/// Binding the field into a schema also declares a read-only `is_<mode>_mode`
/// flag per mode unless helpers are disabled.
#[derive(Debug, Clone)]
pub struct ApplicationModeField {
    base: FieldBase,
    rules: StringRules,
    modes: Vec<String>,
    create_helpers: bool,
}

impl ApplicationModeField {
    /// The `development` and `production` modes, with helpers
    pub fn new() -> Self {
        Self::build(DEFAULT_MODES.iter().map(|m| m.to_string()).collect(), true)
    }

    /// Custom modes; an empty list falls back to the defaults
    ///
    /// With helpers enabled every mode must be a plain identifier.
    pub fn with_modes<I, S>(modes: I, create_helpers: bool) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut modes: Vec<String> = modes.into_iter().map(Into::into).collect();
        if modes.is_empty() {
            modes = DEFAULT_MODES.iter().map(|m| m.to_string()).collect();
        }
        if create_helpers {
            if let Some(bad) = modes.iter().find(|mode| !is_identifier(mode)) {
                return Err(ConfigError::type_error(
                    bad.as_str(),
                    "is not a valid mode name",
                ));
            }
        }
        Ok(Self::build(modes, create_helpers))
    }

    fn build(modes: Vec<String>, create_helpers: bool) -> Self {
        Self {
            base: FieldBase::default(),
            rules: StringRules {
                choices: Some(modes.clone()),
                case: Some(Case::Lower),
                strip: Some(Strip::Whitespace),
                ..StringRules::default()
            },
            modes,
            create_helpers,
        }
    }

    pub fn modes(&self) -> &[String] {
        &self.modes
    }
}

fn is_identifier(mode: &str) -> bool {
    !mode.is_empty() && mode.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl_field_options!(StringField, ApplicationModeField, UrlField);

impl Field for ApplicationModeField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        format!("mode[{}]", self.modes.join("|"))
    }

    fn bind_key(&self, schema: &Schema, key: &str) -> Result<(), ConfigError> {
        if !self.create_helpers {
            return self.base.bind(key);
        }

        // Nothing is bound or declared unless every helper name is free.
        let helpers: Vec<(String, &String)> = self
            .modes
            .iter()
            .map(|mode| (format!("is_{}_mode", mode), mode))
            .collect();
        for (i, (name, _)) in helpers.iter().enumerate() {
            let taken = name == key
                || schema.get(name).is_some()
                || helpers[..i].iter().any(|(earlier, _)| earlier == name);
            if taken {
                return Err(ConfigError::type_error(
                    name.as_str(),
                    format!("mode helper for '{}' collides with an existing key", key),
                ));
            }
        }

        self.base.bind(key)?;
        for (name, mode) in helpers {
            let (key, active) = (key.to_string(), mode.clone());
            schema.field(
                &name,
                VirtualField::new(move |cfg| Ok(FieldValue::from(cfg.get(&key)? == active.as_str()))),
            )?;
        }
        Ok(())
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        let text = self.rules.apply(self.name(), text)?;
        Ok(FieldValue::Basic(Value::String(text)))
    }
}

/// Absolute URL with a scheme
#[derive(Debug, Clone)]
pub struct UrlField {
    base: FieldBase,
}

impl UrlField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

impl Field for UrlField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "url".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        match url::Url::parse(text) {
            Ok(url) if !url.scheme().is_empty() => Ok(value),
            _ => Err(ConfigError::validation(self.name(), "is not a valid URL")),
        }
    }
}
