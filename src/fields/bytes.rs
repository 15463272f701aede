use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::value::{FieldValue, Value};
use base64::{engine::general_purpose, Engine as _};
use std::{fmt, str::FromStr};

/// Text encoding used for the basic form of a [`BytesField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Base64,
    Hex,
}

impl Encoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Base64 => general_purpose::STANDARD.encode(bytes),
            Encoding::Hex => hex::encode(bytes),
        }
    }

    pub fn decode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            Encoding::Base64 => general_purpose::STANDARD.decode(text).ok(),
            Encoding::Hex => hex::decode(text).ok(),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Base64 => write!(f, "base64"),
            Encoding::Hex => write!(f, "hex"),
        }
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base64" => Ok(Encoding::Base64),
            "hex" => Ok(Encoding::Hex),
            other => Err(ConfigError::type_error(
                "encoding",
                format!("unsupported bytes encoding '{}' (expected base64 or hex)", other),
            )),
        }
    }
}

/// Binary data, stored as raw bytes and serialized as base64 or hex text
///
/// Assigned strings are taken as their UTF-8 bytes; only the basic form is
/// decoded.
#[derive(Debug, Clone)]
pub struct BytesField {
    base: FieldBase,
    encoding: Encoding,
}

impl BytesField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            encoding: Encoding::default(),
        }
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn get_encoding(&self) -> Encoding {
        self.encoding
    }
}

impl_field_options!(BytesField);

impl Field for BytesField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        format!("bytes[{}]", self.encoding)
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        match value {
            FieldValue::Bytes(bytes) => Ok(FieldValue::Bytes(bytes)),
            FieldValue::Basic(Value::String(s)) => Ok(FieldValue::Bytes(s.into_bytes())),
            _ => Err(ConfigError::validation(self.name(), "is not a bytes value")),
        }
    }

    fn to_basic(&self, _cfg: &Config, value: &FieldValue) -> Result<Value, ConfigError> {
        match value {
            FieldValue::Bytes(bytes) => Ok(Value::String(self.encoding.encode(bytes))),
            other if other.is_null() => Ok(Value::Null),
            other => Err(ConfigError::TypeMismatch {
                key: self.name().to_string(),
                expected: "bytes".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    fn from_basic(&self, cfg: &Config, value: Value) -> Result<FieldValue, ConfigError> {
        match value {
            Value::Null => self.validate(cfg, FieldValue::default()),
            Value::String(text) => {
                let bytes = self.encoding.decode(&text).ok_or_else(|| {
                    ConfigError::validation(
                        self.name(),
                        format!("is not valid {} data", self.encoding),
                    )
                })?;
                self.validate(cfg, FieldValue::Bytes(bytes))
            }
            _ => Err(ConfigError::validation(
                self.name(),
                format!("must be a {} encoded string", self.encoding),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn cfg() -> Config {
        Schema::new().instantiate()
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("hex".parse::<Encoding>().unwrap(), Encoding::Hex);
        assert_eq!("BASE64".parse::<Encoding>().unwrap(), Encoding::Base64);
        assert!(matches!("asdf".parse::<Encoding>(), Err(ConfigError::Type { .. })));
    }

    #[test]
    fn test_validate_str_and_bytes() {
        let field = BytesField::new();
        let expected = FieldValue::from(b"hello".as_slice());
        assert_eq!(field.validate(&cfg(), "hello".into()).unwrap(), expected);
        assert_eq!(field.validate(&cfg(), expected.clone()).unwrap(), expected);
    }

    #[test]
    fn test_validate_invalid_type() {
        let field = BytesField::new().display_name("key");
        assert_eq!(
            field.validate(&cfg(), 100.into()).unwrap_err(),
            ConfigError::validation("key", "is not a bytes value")
        );
    }

    #[test]
    fn test_to_basic() {
        let value = FieldValue::from(b"hello".as_slice());
        assert_eq!(BytesField::new().to_basic(&cfg(), &value).unwrap(), "aGVsbG8=");
        assert_eq!(
            BytesField::new()
                .encoding(Encoding::Hex)
                .to_basic(&cfg(), &value)
                .unwrap(),
            "68656c6c6f"
        );
        assert!(BytesField::new()
            .to_basic(&cfg(), &FieldValue::default())
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_from_basic_base64() {
        let field = BytesField::new();
        let value = field.from_basic(&cfg(), Value::from("aGVsbG8=")).unwrap();
        assert_eq!(value.as_bytes(), Some(b"hello".as_slice()));
        assert!(field.from_basic(&cfg(), Value::from("hello")).is_err());
    }

    #[test]
    fn test_from_basic_hex() {
        let field = BytesField::new().encoding(Encoding::Hex);
        let value = field.from_basic(&cfg(), Value::from("deadbeef")).unwrap();
        assert_eq!(value.as_bytes(), Some(b"\xde\xad\xbe\xef".as_slice()));
        assert!(matches!(
            field.from_basic(&cfg(), Value::from("hello")),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_from_basic_rejects_non_string() {
        let field = BytesField::new();
        assert!(field.from_basic(&cfg(), Value::from(100)).is_err());
        assert!(field.from_basic(&cfg(), Value::Null).unwrap().is_null());
    }

    #[test]
    fn test_config_round_trip() {
        let schema = Schema::new();
        schema
            .field("key", BytesField::new().encoding(Encoding::Hex).default("00ff"))
            .unwrap();
        let cfg = schema.instantiate();

        assert_eq!(cfg.get("key").unwrap().as_bytes(), Some(b"\x00\xff".as_slice()));
        cfg.set("key", b"\x01\x02".as_slice()).unwrap();
        assert_eq!(cfg.to_basic().unwrap(), Value::from([("key", "0102")]));
    }
}
