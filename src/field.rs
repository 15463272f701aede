use crate::config::Config;
use crate::error::ConfigError;
use crate::schema::Schema;
use crate::value::{FieldValue, Value};
use std::{cell::OnceCell, fmt, rc::Rc};

/// Custom check run after a field's own coercion
pub type Validator = Rc<dyn Fn(&Config, FieldValue) -> Result<FieldValue, ConfigError>>;

/// Default for a field: a literal basic value or a producer called on each materialization
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Rc<dyn Fn() -> Value>),
}

impl DefaultValue {
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => write!(f, "{:?}", value),
            DefaultValue::Factory(_) => write!(f, "<factory>"),
        }
    }
}

/// Options every field kind accepts
#[derive(Clone, Default)]
pub struct FieldOptions {
    /// Name used in error messages, falls back to the key
    pub name: Option<String>,
    /// Human-readable description of what this field configures
    pub description: Option<String>,
    /// Whether null (or an empty collection) is rejected
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub validator: Option<Validator>,
}

impl FieldOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// State shared by every field: the key it is installed under and its options
#[derive(Debug, Clone, Default)]
pub struct FieldBase {
    key: OnceCell<String>,
    pub(crate) options: FieldOptions,
}

impl FieldBase {
    pub fn new(options: FieldOptions) -> Self {
        Self {
            key: OnceCell::new(),
            options,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.get().map(String::as_str)
    }

    /// Binds the key. A field is bound exactly once.
    pub fn bind(&self, key: &str) -> Result<(), ConfigError> {
        if let Some(existing) = self.key() {
            return Err(ConfigError::type_error(
                key,
                format!("field is already bound to '{}'", existing),
            ));
        }
        self.key
            .set(key.to_string())
            .map_err(|_| ConfigError::type_error(key, "field is already bound"))
    }

    pub fn name(&self) -> &str {
        self.options
            .name
            .as_deref()
            .or_else(|| self.key())
            .unwrap_or("value")
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// The key used in the config's store
    pub fn storage_key(&self) -> Result<&str, ConfigError> {
        self.key()
            .ok_or_else(|| ConfigError::type_error(self.name(), "field is not bound to a schema"))
    }
}

/// Validation, coercion and serialization policy for one configuration key
///
/// Implementors provide `base`, `kind` and usually `validate_value`; the remaining
/// methods carry the shared get/set/default behavior and can be overridden by
/// fields that are not plain data.
pub trait Field: fmt::Debug {
    fn base(&self) -> &FieldBase;

    /// Short description of the stored type, used in docs and errors
    fn kind(&self) -> String;

    fn key(&self) -> Option<&str> {
        self.base().key()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn is_required(&self) -> bool {
        self.base().options.required
    }

    fn default_value(&self) -> Option<Value> {
        self.base().options.default.as_ref().map(DefaultValue::resolve)
    }

    /// False for computed fields that are neither stored nor serialized
    fn is_data(&self) -> bool {
        true
    }

    /// Called once when the field is attached to `schema` under `key`
    fn bind_key(&self, schema: &Schema, key: &str) -> Result<(), ConfigError> {
        let _ = schema;
        self.base().bind(key)
    }

    /// Field-specific coercion of a non-null value
    fn validate_value(&self, cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let _ = cfg;
        Ok(value)
    }

    fn validate(&self, cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        if value.is_null() {
            if self.is_required() {
                return Err(ConfigError::validation(self.name(), "is required"));
            }
            return Ok(value);
        }

        let value = self.validate_value(cfg, value)?;
        match &self.base().options.validator {
            Some(validator) => validator(cfg, value),
            None => Ok(value),
        }
    }

    /// Writes the default into the config's store
    fn set_default(&self, cfg: &Config) -> Result<(), ConfigError> {
        let key = self.base().storage_key()?;
        let value = match self.default_value() {
            Some(value) if !value.is_null() => self.from_basic(cfg, value)?,
            _ => FieldValue::default(),
        };
        tracing::trace!(key, "materialized default");
        cfg.store(key, value);
        Ok(())
    }

    /// Reads the stored value, persisting the default on first read
    fn get_value(&self, cfg: &Config) -> Result<FieldValue, ConfigError> {
        let key = self.base().storage_key()?;
        if let Some(value) = cfg.stored(key) {
            return Ok(value);
        }
        self.set_default(cfg)?;
        Ok(cfg.stored(key).unwrap_or_default())
    }

    fn set_value(&self, cfg: &Config, value: FieldValue) -> Result<(), ConfigError> {
        let key = self.base().storage_key()?;
        let value = self.validate(cfg, value)?;
        cfg.store(key, value);
        Ok(())
    }

    fn to_basic(&self, cfg: &Config, value: &FieldValue) -> Result<Value, ConfigError> {
        let _ = cfg;
        value.to_basic()
    }

    fn from_basic(&self, cfg: &Config, value: Value) -> Result<FieldValue, ConfigError> {
        self.validate(cfg, FieldValue::Basic(value))
    }

    /// Turns a raw text override (for example an environment variable) into a basic value
    fn parse_str(&self, raw: &str) -> Value {
        Value::String(raw.to_string())
    }
}

/// A field that accepts any value unchanged
#[derive(Debug, Clone)]
pub struct AnyField {
    base: FieldBase,
}

impl AnyField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

impl_field_options!(AnyField);

impl Field for AnyField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "any".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(field: AnyField, key: &str) -> (AnyField, Config) {
        let schema = Schema::new();
        field.bind_key(&schema, key).unwrap();
        (field, schema.instantiate())
    }

    #[test]
    fn test_default_value() {
        let field = AnyField::new().default(2);
        assert_eq!(field.default_value(), Some(Value::Int(2)));
    }

    #[test]
    fn test_default_factory() {
        let field = AnyField::new().default_with(|| Value::List(Vec::new()));
        assert_eq!(field.default_value(), Some(Value::List(Vec::new())));
    }

    #[test]
    fn test_name_prefers_display_name() {
        let (field, _cfg) = bound(AnyField::new().display_name("pretty"), "key");
        assert_eq!(field.name(), "pretty");
        assert_eq!(field.key(), Some("key"));
    }

    #[test]
    fn test_name_falls_back_to_key() {
        let (field, _cfg) = bound(AnyField::new(), "key");
        assert_eq!(field.name(), "key");
    }

    #[test]
    fn test_bind_twice_fails() {
        let (field, _cfg) = bound(AnyField::new(), "key");
        let result = field.bind_key(&Schema::new(), "other");
        assert!(matches!(result, Err(ConfigError::Type { .. })));
        assert_eq!(field.key(), Some("key"));
    }

    #[test]
    fn test_set_value_stores() {
        let (field, cfg) = bound(AnyField::new(), "key");
        field.set_value(&cfg, "hello".into()).unwrap();
        assert_eq!(cfg.stored("key"), Some(FieldValue::from("hello")));
    }

    #[test]
    fn test_get_value_reads_store() {
        let (field, cfg) = bound(AnyField::new(), "key");
        cfg.store("key", "hello".into());
        assert_eq!(field.get_value(&cfg).unwrap(), "hello");
    }

    #[test]
    fn test_set_default_stores() {
        let (field, cfg) = bound(AnyField::new().default("hello"), "key");
        field.set_default(&cfg).unwrap();
        assert_eq!(cfg.stored("key"), Some(FieldValue::from("hello")));
    }

    #[test]
    fn test_get_value_persists_default() {
        let (field, cfg) = bound(AnyField::new().default(7), "key");
        assert!(cfg.stored("key").is_none());
        assert_eq!(field.get_value(&cfg).unwrap(), 7);
        assert_eq!(cfg.stored("key"), Some(FieldValue::from(7)));
    }

    #[test]
    fn test_unbound_get_fails() {
        let field = AnyField::new();
        let cfg = Schema::new().instantiate();
        assert!(matches!(field.get_value(&cfg), Err(ConfigError::Type { .. })));
    }

    #[test]
    fn test_to_basic_and_from_basic_identity() {
        let (field, cfg) = bound(AnyField::new(), "key");
        let value = FieldValue::from("hello");
        assert_eq!(field.to_basic(&cfg, &value).unwrap(), "hello");
        assert_eq!(field.from_basic(&cfg, Value::from("hello")).unwrap(), "hello");
    }

    #[test]
    fn test_required_rejects_null() {
        let (field, cfg) = bound(AnyField::new().required(), "key");
        let result = field.validate(&cfg, FieldValue::default());
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_not_required_accepts_null() {
        let (field, cfg) = bound(AnyField::new(), "key");
        assert!(field.validate(&cfg, FieldValue::default()).unwrap().is_null());
    }

    #[test]
    fn test_custom_validator_replaces_value() {
        let (field, cfg) = bound(
            AnyField::new().validator(|_, _| Ok(FieldValue::from("HELLO"))),
            "key",
        );
        assert_eq!(field.validate(&cfg, "asdf".into()).unwrap(), "HELLO");
    }

    #[test]
    fn test_custom_validator_error_propagates() {
        let (field, cfg) = bound(
            AnyField::new().validator(|_, _| Err(ConfigError::validation("key", "nope"))),
            "key",
        );
        let result = field.validate(&cfg, "hello".into());
        assert_eq!(result.unwrap_err(), ConfigError::validation("key", "nope"));
    }
}
