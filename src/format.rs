//! JSON encoding of configs through their basic form

use crate::config::Config;
use crate::error::ConfigError;
use crate::value::Value;

/// Serializes the config's basic form to JSON
pub fn dumps(cfg: &Config, pretty: bool) -> Result<String, ConfigError> {
    let tree = cfg.to_basic()?;
    let encoded = if pretty {
        serde_json::to_string_pretty(&tree)
    } else {
        serde_json::to_string(&tree)
    };
    encoded.map_err(|e| ConfigError::Format {
        message: e.to_string(),
    })
}

/// Parses a JSON document and loads it into `cfg`
///
/// The document must be an object; loading validates the whole config.
pub fn loads(cfg: &Config, text: &str) -> Result<(), ConfigError> {
    let tree: Value = serde_json::from_str(text).map_err(|e| ConfigError::Format {
        message: e.to_string(),
    })?;
    tracing::debug!(kind = tree.type_name(), "decoded document");
    cfg.load_from_basic(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IntField, ListField, StringField};
    use crate::schema::Schema;

    fn schema() -> Schema {
        let schema = Schema::new();
        schema.field("name", StringField::new().default("web")).unwrap();
        schema.field("ports", ListField::new(IntField::port())).unwrap();
        schema
            .schema("limits")
            .unwrap()
            .field("ratio", crate::fields::FloatField::new().default(0.5))
            .unwrap();
        schema
    }

    #[test]
    fn test_dumps_keeps_schema_order() {
        let cfg = schema().instantiate();
        cfg.list("ports").unwrap().append(80).unwrap();
        assert_eq!(
            dumps(&cfg, false).unwrap(),
            r#"{"name":"web","ports":[80],"limits":{"ratio":0.5}}"#
        );
    }

    #[test]
    fn test_loads_validates() {
        let cfg = schema().instantiate();
        loads(&cfg, r#"{"ports": ["443", 8443], "limits": {"ratio": 2}}"#).unwrap();
        assert_eq!(cfg.list("ports").unwrap(), vec![443i64, 8443]);
        assert_eq!(cfg.get_path("limits.ratio").unwrap(), 2.0);
    }

    #[test]
    fn test_round_trip() {
        let source = schema().instantiate();
        source.set("name", "api").unwrap();
        source.list("ports").unwrap().extend(vec![1, 2]).unwrap();

        let text = dumps(&source, true).unwrap();
        let target = schema().instantiate();
        loads(&target, &text).unwrap();
        assert_eq!(target.to_basic().unwrap(), source.to_basic().unwrap());
    }

    #[test]
    fn test_loads_errors() {
        let cfg = schema().instantiate();
        assert!(matches!(loads(&cfg, "{"), Err(ConfigError::Format { .. })));
        assert!(matches!(loads(&cfg, "[1]"), Err(ConfigError::TypeMismatch { .. })));
        assert!(matches!(
            loads(&cfg, r#"{"ports": [0]}"#),
            Err(ConfigError::Validation { .. })
        ));
    }
}
