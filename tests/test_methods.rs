use config_schema::{
    CallArgs, Config, ConfigError, Field, FieldOptions, FieldValue, InstanceMethodField, IntField,
    Schema, Value,
};

fn scaled(cfg: &Config, args: &CallArgs) -> Result<FieldValue, ConfigError> {
    let base = cfg.get("base")?.as_int().unwrap_or_default();
    let factor = args.get(0, "factor").and_then(Value::as_int).unwrap_or(1);
    let offset = args.get(1, "offset").and_then(Value::as_int).unwrap_or(0);
    Ok(FieldValue::from(base * factor + offset))
}

fn schema() -> Schema {
    let schema = Schema::new();
    schema.field("base", IntField::new().default(10)).unwrap();
    schema.field("scaled", InstanceMethodField::new("scaled", scaled)).unwrap();
    schema
}

#[test]
fn test_default_is_rejected_at_construction() {
    let result = InstanceMethodField::with_options("scaled", scaled, FieldOptions::new().default_value(1));
    assert!(matches!(result, Err(ConfigError::Type { .. })));
}

#[test]
fn test_call_with_positional_and_keyword_args() {
    let cfg = schema().instantiate();

    let result = cfg
        .call("scaled", CallArgs::new().with_arg(3).with_kwarg("offset", 2))
        .unwrap();
    assert_eq!(result, 32);

    let method = cfg.get("scaled").unwrap();
    assert_eq!(method.as_method().unwrap().name(), "scaled");
}

#[test]
fn test_method_sees_current_values() {
    let cfg = schema().instantiate();
    let method = cfg.get("scaled").unwrap();
    cfg.set("base", 4).unwrap();
    assert_eq!(method.as_method().unwrap().call(CallArgs::new()).unwrap(), 4);
}

#[test]
fn test_set_always_fails() {
    let cfg = schema().instantiate();
    assert!(matches!(cfg.set("scaled", 1), Err(ConfigError::Type { .. })));
}

#[test]
fn test_reading_does_not_touch_store() {
    let schema = schema();
    let cfg = schema.instantiate();
    let field = schema.get_field("scaled").unwrap();

    field.get_value(&cfg).unwrap();
    cfg.get("scaled").unwrap();
    assert!(cfg.stored_keys().is_empty());
}

#[test]
fn test_methods_are_not_serialized() {
    let cfg = schema().instantiate();
    assert_eq!(cfg.to_basic().unwrap(), Value::from([("base", 10)]));
    assert!(matches!(
        cfg.load_from_basic(Value::from([("scaled", 1)])),
        Err(ConfigError::Type { .. })
    ));
}
