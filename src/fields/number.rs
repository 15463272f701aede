use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::value::{FieldValue, Value};

/// Integer field with optional bounds
///
/// Accepts integers, floats (truncated), booleans and numeric strings.
#[derive(Debug, Clone)]
pub struct IntField {
    base: FieldBase,
    min: Option<i64>,
    max: Option<i64>,
}

impl IntField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            min: None,
            max: None,
        }
    }

    /// Network port: an integer in `1..=65535`
    pub fn port() -> Self {
        Self::new().min(1).max(65535)
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }

    fn coerce(&self, value: &Value) -> Option<i64> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
            Value::Float(f) if (i64::MIN as f64..i64::MAX as f64).contains(&f.trunc()) => {
                Some(f.trunc() as i64)
            }
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl_field_options!(IntField, FloatField);

impl Field for IntField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "int".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let number = value
            .as_value()
            .and_then(|v| self.coerce(v))
            .ok_or_else(|| ConfigError::validation(self.name(), "is not a valid int"))?;
        check_bounds(self.name(), number, self.min, self.max)?;
        Ok(FieldValue::Basic(Value::Int(number)))
    }
}

/// Floating point field with optional bounds
#[derive(Debug, Clone)]
pub struct FloatField {
    base: FieldBase,
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            min: None,
            max: None,
        }
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }
}

impl Field for FloatField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "float".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let number = match value.as_value() {
            Some(Value::Float(f)) => Some(*f),
            Some(Value::Int(i)) => Some(*i as f64),
            Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| ConfigError::validation(self.name(), "is not a valid float"))?;
        check_bounds(self.name(), number, self.min, self.max)?;
        Ok(FieldValue::Basic(Value::Float(number)))
    }
}

fn check_bounds<N>(name: &str, value: N, min: Option<N>, max: Option<N>) -> Result<(), ConfigError>
where
    N: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(min) = min {
        if value < min {
            return Err(ConfigError::validation(name, format!("must be >= {}", min)));
        }
    }
    if let Some(max) = max {
        if value > max {
            return Err(ConfigError::validation(name, format!("must be <= {}", max)));
        }
    }
    Ok(())
}
