use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::value::{FieldValue, Value};
use std::{fmt, rc::Rc};

/// Accepted values that evaluate to `true`
pub const TRUE_VALUES: &[&str] = &["t", "true", "1", "on", "yes", "y"];
/// Accepted values that evaluate to `false`
pub const FALSE_VALUES: &[&str] = &["f", "false", "0", "off", "no", "n"];

/// Boolean field accepting booleans, numbers and common truthy/falsy words
#[derive(Debug, Clone)]
pub struct BoolField {
    base: FieldBase,
}

impl BoolField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

impl Field for BoolField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "bool".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let flag = match value.as_value() {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Int(i)) => Some(*i != 0),
            Some(Value::Float(f)) => Some(*f != 0.0),
            Some(Value::String(s)) => {
                let lowered = s.to_lowercase();
                if TRUE_VALUES.contains(&lowered.as_str()) {
                    Some(true)
                } else if FALSE_VALUES.contains(&lowered.as_str()) {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        };
        flag.map(|b| FieldValue::Basic(Value::Bool(b)))
            .ok_or_else(|| ConfigError::validation(self.name(), "is not a valid boolean"))
    }
}

/// Free-form mapping; entries are not validated individually
#[derive(Debug, Clone)]
pub struct DictField {
    base: FieldBase,
}

impl DictField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
        }
    }
}

impl_field_options!(BoolField, DictField);

impl Field for DictField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "map".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        match value {
            FieldValue::Basic(Value::Map(map)) => {
                if self.is_required() && map.is_empty() {
                    return Err(ConfigError::validation(self.name(), "is required"));
                }
                Ok(FieldValue::Basic(Value::Map(map)))
            }
            _ => Err(ConfigError::validation(self.name(), "is not a map object")),
        }
    }
}

/// Getter behind a `VirtualField`
pub type Getter = Rc<dyn Fn(&Config) -> Result<FieldValue, ConfigError>>;

/// Calculated, read-only field that is never stored or serialized
#[derive(Clone)]
pub struct VirtualField {
    base: FieldBase,
    getter: Getter,
}

impl VirtualField {
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn(&Config) -> Result<FieldValue, ConfigError> + 'static,
    {
        Self {
            base: FieldBase::default(),
            getter: Rc::new(getter),
        }
    }
}

impl fmt::Debug for VirtualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualField")
            .field("key", &self.base.key())
            .finish()
    }
}

impl Field for VirtualField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "virtual".to_string()
    }

    fn is_data(&self) -> bool {
        false
    }

    fn set_default(&self, _cfg: &Config) -> Result<(), ConfigError> {
        Ok(())
    }

    fn get_value(&self, cfg: &Config) -> Result<FieldValue, ConfigError> {
        (self.getter)(cfg)
    }

    fn set_value(&self, _cfg: &Config, _value: FieldValue) -> Result<(), ConfigError> {
        Err(ConfigError::type_error(self.name(), "is read-only"))
    }

    fn to_basic(&self, _cfg: &Config, _value: &FieldValue) -> Result<Value, ConfigError> {
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use std::cell::Cell;

    fn cfg() -> Config {
        Schema::new().instantiate()
    }

    #[test]
    fn test_bool_words() {
        let field = BoolField::new();
        for word in ["T", "true", "1", "on", "Yes", "y"] {
            assert_eq!(field.validate(&cfg(), word.into()).unwrap(), true);
        }
        for word in ["f", "FALSE", "0", "off", "no", "N"] {
            assert_eq!(field.validate(&cfg(), word.into()).unwrap(), false);
        }
    }

    #[test]
    fn test_bool_numbers() {
        let field = BoolField::new();
        assert_eq!(field.validate(&cfg(), 2.into()).unwrap(), true);
        assert_eq!(field.validate(&cfg(), 0.0.into()).unwrap(), false);
    }

    #[test]
    fn test_bool_invalid() {
        let field = BoolField::new();
        assert!(field.validate(&cfg(), "maybe".into()).is_err());
        assert!(field.validate(&cfg(), vec![true].into()).is_err());
    }

    #[test]
    fn test_dict_accepts_map() {
        let field = DictField::new();
        let value = FieldValue::from([("a", 1)]);
        assert_eq!(field.validate(&cfg(), value.clone()).unwrap(), value);
    }

    #[test]
    fn test_dict_rejects_non_map() {
        let field = DictField::new();
        assert!(field.validate(&cfg(), "a=1".into()).is_err());
    }

    #[test]
    fn test_dict_required_rejects_empty() {
        let field = DictField::new().required();
        let empty = FieldValue::Basic(Value::Map(Default::default()));
        assert!(field.validate(&cfg(), empty).is_err());
    }

    #[test]
    fn test_virtual_get_calls_getter() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let field = VirtualField::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(FieldValue::from("hello"))
        });

        let cfg = cfg();
        assert_eq!(field.get_value(&cfg).unwrap(), "hello");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_virtual_set_fails_without_calling_getter() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let field = VirtualField::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(FieldValue::default())
        });

        let result = field.set_value(&cfg(), "goodbye".into());
        assert!(matches!(result, Err(ConfigError::Type { .. })));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_virtual_no_setdefault() {
        let field = VirtualField::new(|_| Ok(FieldValue::from("hello")));
        let cfg = cfg();
        field.set_default(&cfg).unwrap();
        assert!(cfg.stored_keys().is_empty());
    }
}
