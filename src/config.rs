use crate::error::ConfigError;
use crate::field::{AnyField, Field};
use crate::fields::{CallArgs, ListProxy};
use crate::schema::{check_name, Schema, SchemaEntry};
use crate::value::{FieldValue, Value};
use indexmap::IndexMap;
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

struct ConfigInner {
    schema: Schema,
    parent: RefCell<Weak<ConfigInner>>,
    data: RefCell<IndexMap<String, FieldValue>>,
    // Keys declared on this config alone when its schema is dynamic.
    dynamic: RefCell<IndexMap<String, Rc<dyn Field>>>,
}

// Store contents saved before a load, nested slot configs included.
struct Snapshot {
    data: IndexMap<String, FieldValue>,
    dynamic: IndexMap<String, Rc<dyn Field>>,
    children: Vec<(Config, Snapshot)>,
}

/// A live instance of a schema holding validated values
///
/// `Config` is a shared handle; clones refer to the same store. Nested configs keep
/// a non-owning link to their parent.
#[derive(Clone)]
pub struct Config {
    inner: Rc<ConfigInner>,
}

/// Non-owning reference to a config
#[derive(Clone, Default)]
pub struct WeakConfig(Weak<ConfigInner>);

impl WeakConfig {
    pub fn upgrade(&self) -> Option<Config> {
        self.0.upgrade().map(|inner| Config { inner })
    }
}

impl fmt::Debug for WeakConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakConfig({})", if self.0.strong_count() > 0 { "live" } else { "dropped" })
    }
}

impl Config {
    pub fn new(schema: &Schema, parent: Option<&Config>) -> Self {
        Self {
            inner: Rc::new(ConfigInner {
                schema: schema.clone(),
                parent: RefCell::new(parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner))),
                data: RefCell::new(IndexMap::new()),
                dynamic: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// The exact schema this config was created from
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    pub fn parent(&self) -> Option<Config> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Config { inner })
    }

    pub fn set_parent(&self, parent: Option<&Config>) {
        *self.inner.parent.borrow_mut() = parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner));
    }

    pub fn downgrade(&self) -> WeakConfig {
        WeakConfig(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &Config) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Raw read of the private store, for field implementations
    pub fn stored(&self, key: &str) -> Option<FieldValue> {
        self.inner.data.borrow().get(key).cloned()
    }

    /// Raw write to the private store, for field implementations
    pub fn store(&self, key: impl Into<String>, value: FieldValue) {
        self.inner.data.borrow_mut().insert(key.into(), value);
    }

    /// Keys currently present in the private store
    pub fn stored_keys(&self) -> Vec<String> {
        self.inner.data.borrow().keys().cloned().collect()
    }

    fn lookup(&self, name: &str) -> Option<SchemaEntry> {
        self.schema().get(name).or_else(|| {
            self.inner
                .dynamic
                .borrow()
                .get(name)
                .cloned()
                .map(SchemaEntry::Field)
        })
    }

    fn entry(&self, name: &str) -> Result<SchemaEntry, ConfigError> {
        self.lookup(name).ok_or_else(|| ConfigError::UnknownKey {
            key: name.to_string(),
        })
    }

    /// The field declared under `name`, in the schema or dynamically on this config
    pub fn field(&self, name: &str) -> Option<Rc<dyn Field>> {
        self.lookup(name).and_then(|entry| entry.as_field().cloned())
    }

    /// Keys added to this config through its dynamic schema, in assignment order
    pub fn dynamic_keys(&self) -> Vec<String> {
        self.inner.dynamic.borrow().keys().cloned().collect()
    }

    fn dynamic_fields(&self) -> Vec<(String, Rc<dyn Field>)> {
        self.inner
            .dynamic
            .borrow()
            .iter()
            .map(|(key, field)| (key.clone(), field.clone()))
            .collect()
    }

    // Entry for an assignment: declared keys, or a new `AnyField` on dynamic schemas.
    fn entry_for_write(&self, name: &str) -> Result<(SchemaEntry, bool), ConfigError> {
        if let Some(entry) = self.lookup(name) {
            return Ok((entry, false));
        }
        if !self.schema().is_dynamic() {
            return Err(ConfigError::UnknownKey {
                key: name.to_string(),
            });
        }
        check_name(name)?;
        let field: Rc<dyn Field> = Rc::new(AnyField::new());
        field.bind_key(self.schema(), name)?;
        Ok((SchemaEntry::Field(field), true))
    }

    fn declare_dynamic(&self, name: &str, entry: &SchemaEntry) {
        if let Some(field) = entry.as_field() {
            tracing::debug!(key = name, "declared dynamic field");
            self.inner
                .dynamic
                .borrow_mut()
                .insert(name.to_string(), field.clone());
        }
    }

    fn nested_config(&self, name: &str, schema: &Schema) -> Config {
        if let Some(FieldValue::Config(existing)) = self.stored(name) {
            return existing;
        }
        let child = schema.instantiate_in(self);
        self.store(name, FieldValue::Config(child.clone()));
        child
    }

    /// Reads `name`: a field's value (materializing its default) or the nested config
    ///
    /// Unknown keys read as null when the schema is dynamic.
    pub fn get(&self, name: &str) -> Result<FieldValue, ConfigError> {
        match self.lookup(name) {
            Some(SchemaEntry::Field(field)) => field.get_value(self),
            Some(SchemaEntry::Schema(schema)) => {
                Ok(FieldValue::Config(self.nested_config(name, &schema)))
            }
            None if self.schema().is_dynamic() => Ok(FieldValue::default()),
            None => Err(ConfigError::UnknownKey {
                key: name.to_string(),
            }),
        }
    }

    /// Validates and assigns `value` to `name`
    ///
    /// A nested schema slot accepts a config of that schema or a mapping; the
    /// previous value is kept when validation fails.
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        let value = value.into();
        let (entry, created) = self.entry_for_write(name)?;
        let result = match &entry {
            SchemaEntry::Field(field) => field.set_value(self, value),
            SchemaEntry::Schema(schema) => match value {
                value @ (FieldValue::Config(_) | FieldValue::Basic(Value::Map(_))) => schema
                    .coerce(self, value)
                    .map(|child| self.store(name, FieldValue::Config(child))),
                other => Err(ConfigError::type_error(
                    name,
                    format!("nested schema cannot be overwritten with {}", other.type_name()),
                )),
            },
        };
        match &result {
            Ok(()) if created => self.declare_dynamic(name, &entry),
            Ok(()) => {}
            Err(e) => tracing::debug!(key = name, error = %e, "rejected assignment"),
        }
        result
    }

    /// The nested config declared under `name`
    pub fn nested(&self, name: &str) -> Result<Config, ConfigError> {
        match self.entry(name)? {
            SchemaEntry::Schema(schema) => Ok(self.nested_config(name, &schema)),
            SchemaEntry::Field(_) => Err(ConfigError::type_error(name, "is not a nested schema")),
        }
    }

    /// The list proxy stored under `name`
    pub fn list(&self, name: &str) -> Result<ListProxy, ConfigError> {
        match self.get(name)? {
            FieldValue::List(list) => Ok(list),
            other => Err(ConfigError::TypeMismatch {
                key: name.to_string(),
                expected: "list".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Invokes the method field `name` with `args`
    pub fn call(&self, name: &str, args: CallArgs) -> Result<FieldValue, ConfigError> {
        match self.get(name)? {
            FieldValue::Method(method) => method.call(args),
            other => Err(ConfigError::TypeMismatch {
                key: name.to_string(),
                expected: "method".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Reads a dotted path such as `db.pool`
    pub fn get_path(&self, path: &str) -> Result<FieldValue, ConfigError> {
        let (cfg, last) = self.walk(path)?;
        cfg.get(last)
    }

    /// Assigns to a dotted path such as `db.pool`
    pub fn set_path(&self, path: &str, value: impl Into<FieldValue>) -> Result<(), ConfigError> {
        let (cfg, last) = self.walk(path)?;
        cfg.set(last, value)
    }

    fn walk<'p>(&self, path: &'p str) -> Result<(Config, &'p str), ConfigError> {
        let mut parts: Vec<&str> = path.split('.').collect();
        let last = parts.pop().unwrap_or(path);
        let mut cfg = self.clone();
        for part in parts {
            cfg = cfg.nested(part)?;
        }
        Ok((cfg, last))
    }

    // Schema entries in declaration order, then dynamic keys in assignment order.
    fn entries(&self) -> Vec<(String, SchemaEntry)> {
        let mut entries: Vec<(String, SchemaEntry)> = self.schema().iter().collect();
        entries.extend(
            self.dynamic_fields()
                .into_iter()
                .map(|(key, field)| (key, SchemaEntry::Field(field))),
        );
        entries
    }

    /// Every data key with its current value: fields, nested configs and dynamic keys
    ///
    /// Computed fields are skipped. Defaults are materialized as with [`Config::get`].
    pub fn iter(&self) -> Result<std::vec::IntoIter<(String, FieldValue)>, ConfigError> {
        let mut items = Vec::new();
        for (key, entry) in self.entries() {
            let value = match entry {
                SchemaEntry::Field(field) if field.is_data() => field.get_value(self)?,
                SchemaEntry::Field(_) => continue,
                SchemaEntry::Schema(schema) => {
                    FieldValue::Config(self.nested_config(&key, &schema))
                }
            };
            items.push((key, value));
        }
        Ok(items.into_iter())
    }

    /// Converts the whole tree to basic form in schema order
    ///
    /// Reading materializes defaults, so they appear in the output. Computed fields
    /// are skipped.
    pub fn to_basic(&self) -> Result<Value, ConfigError> {
        let mut map = IndexMap::new();
        for (key, entry) in self.entries() {
            match entry {
                SchemaEntry::Field(field) => {
                    if !field.is_data() {
                        continue;
                    }
                    let value = field.get_value(self)?;
                    map.insert(key, field.to_basic(self, &value)?);
                }
                SchemaEntry::Schema(schema) => {
                    let child = self.nested_config(&key, &schema);
                    map.insert(key, child.to_basic()?);
                }
            }
        }
        Ok(Value::Map(map))
    }

    /// Loads a basic mapping into this config, then validates the result
    ///
    /// The load is all or nothing: when any entry or the final validation fails,
    /// this config and its nested configs are restored to their previous contents.
    pub fn load_from_basic(&self, value: Value) -> Result<(), ConfigError> {
        let snapshot = self.snapshot();
        let result = self.load_tree(value).and_then(|()| self.validate());
        if let Err(e) = &result {
            tracing::debug!(error = %e, "load failed, restoring previous values");
            self.restore(snapshot);
        }
        result
    }

    fn snapshot(&self) -> Snapshot {
        let data = self.inner.data.borrow().clone();
        let children = data
            .iter()
            .filter_map(|(key, value)| match (self.schema().get(key), value) {
                (Some(SchemaEntry::Schema(_)), FieldValue::Config(child)) => {
                    Some((child.clone(), child.snapshot()))
                }
                _ => None,
            })
            .collect();
        Snapshot {
            data,
            dynamic: self.inner.dynamic.borrow().clone(),
            children,
        }
    }

    fn restore(&self, snapshot: Snapshot) {
        *self.inner.data.borrow_mut() = snapshot.data;
        *self.inner.dynamic.borrow_mut() = snapshot.dynamic;
        for (child, saved) in snapshot.children {
            child.restore(saved);
        }
    }

    fn load_tree(&self, value: Value) -> Result<(), ConfigError> {
        let map = match value {
            Value::Map(map) => map,
            other => {
                return Err(ConfigError::TypeMismatch {
                    key: self.schema().key().unwrap_or("config").to_string(),
                    expected: "map".to_string(),
                    found: other.type_name().to_string(),
                })
            }
        };

        for (key, item) in map {
            let (entry, created) = self.entry_for_write(&key)?;
            match &entry {
                SchemaEntry::Field(field) => {
                    if !field.is_data() {
                        return Err(ConfigError::type_error(&key, "is read-only"));
                    }
                    let value = field.from_basic(self, item)?;
                    if created {
                        self.declare_dynamic(&key, &entry);
                    }
                    self.store(key, value);
                }
                SchemaEntry::Schema(schema) => {
                    self.nested_config(&key, schema).load_tree(item)?;
                }
            }
        }
        Ok(())
    }

    /// Re-validates every data field and nested config (list items included), then
    /// runs schema validators
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, entry) in self.entries() {
            match entry {
                SchemaEntry::Field(field) if field.is_data() => {
                    let value = field.get_value(self)?;
                    if let FieldValue::List(list) = &value {
                        for item in list.iter() {
                            if let FieldValue::Config(child) = item {
                                child.validate()?;
                            }
                        }
                    }
                    field.validate(self, value)?;
                }
                SchemaEntry::Field(_) => {}
                SchemaEntry::Schema(schema) => self.nested_config(&key, &schema).validate()?,
            }
        }
        for validator in self.schema().validators() {
            validator(self)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Config");
        s.field("schema", &self.schema().key());
        match self.inner.data.try_borrow() {
            Ok(data) => s.field("data", &*data),
            Err(_) => s.field("data", &"<borrowed>"),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::AnyField;
    use crate::fields::{BoolField, IntField, ListField, VirtualField};

    fn server_schema() -> Schema {
        let schema = Schema::new();
        schema.field("host", AnyField::new().default("localhost")).unwrap();
        schema.field("port", IntField::port().default(8080)).unwrap();
        let db = schema.schema("db").unwrap();
        db.field("pool", IntField::new().min(1).default(4)).unwrap();
        db.field("debug", BoolField::new().default(false)).unwrap();
        schema
    }

    #[test]
    fn test_new_config_has_empty_store() {
        let cfg = server_schema().instantiate();
        assert!(cfg.stored_keys().is_empty());
        assert!(cfg.parent().is_none());
    }

    #[test]
    fn test_get_materializes_default() {
        let cfg = server_schema().instantiate();
        assert_eq!(cfg.get("port").unwrap(), 8080);
        assert_eq!(cfg.stored_keys(), vec!["port"]);
    }

    #[test]
    fn test_set_coerces() {
        let cfg = server_schema().instantiate();
        cfg.set("port", "9000").unwrap();
        assert_eq!(cfg.get("port").unwrap(), 9000);
    }

    #[test]
    fn test_failed_set_keeps_previous_value() {
        let cfg = server_schema().instantiate();
        cfg.set("port", 9000).unwrap();
        assert!(cfg.set("port", 70000).is_err());
        assert_eq!(cfg.get("port").unwrap(), 9000);
    }

    #[test]
    fn test_unknown_key() {
        let cfg = server_schema().instantiate();
        assert!(matches!(cfg.get("nope"), Err(ConfigError::UnknownKey { .. })));
        assert!(matches!(cfg.set("nope", 1), Err(ConfigError::UnknownKey { .. })));
    }

    #[test]
    fn test_nested_config_is_cached_with_parent() {
        let schema = server_schema();
        let cfg = schema.instantiate();

        let db = cfg.nested("db").unwrap();
        assert!(db.schema().ptr_eq(&schema.schema("db").unwrap()));
        assert!(db.parent().unwrap().ptr_eq(&cfg));
        assert!(cfg.nested("db").unwrap().ptr_eq(&db));
        assert!(cfg.get("db").unwrap().as_config().unwrap().ptr_eq(&db));
    }

    #[test]
    fn test_set_nested_scalar_fails() {
        let cfg = server_schema().instantiate();
        assert!(matches!(cfg.set("db", 2), Err(ConfigError::Type { .. })));
    }

    #[test]
    fn test_set_nested_from_map() {
        let cfg = server_schema().instantiate();
        cfg.set("db", Value::from([("pool", 10)])).unwrap();
        assert_eq!(cfg.get_path("db.pool").unwrap(), 10);
        assert_eq!(cfg.get_path("db.debug").unwrap(), false);
    }

    #[test]
    fn test_set_nested_map_is_atomic() {
        let cfg = server_schema().instantiate();
        cfg.set_path("db.pool", 8).unwrap();
        assert!(cfg.set("db", Value::from([("pool", 0)])).is_err());
        assert_eq!(cfg.get_path("db.pool").unwrap(), 8);
    }

    #[test]
    fn test_set_nested_adopts_config() {
        let schema = server_schema();
        let cfg = schema.instantiate();

        let db = schema.schema("db").unwrap().instantiate();
        db.set("pool", 12).unwrap();
        cfg.set("db", db.clone()).unwrap();

        assert!(db.parent().unwrap().ptr_eq(&cfg));
        assert!(cfg.nested("db").unwrap().ptr_eq(&db));
    }

    #[test]
    fn test_set_nested_other_schema_config_fails() {
        let cfg = server_schema().instantiate();
        let stranger = Schema::new().instantiate();
        assert!(matches!(
            cfg.set("db", stranger),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_path_access() {
        let cfg = server_schema().instantiate();
        cfg.set_path("db.debug", "yes").unwrap();
        assert_eq!(cfg.get_path("db.debug").unwrap(), true);
        assert!(cfg.get_path("db.nope").is_err());
        assert!(cfg.get_path("port.x").is_err());
    }

    #[test]
    fn test_to_basic_in_schema_order() {
        let cfg = server_schema().instantiate();
        cfg.set("host", "example.com").unwrap();

        let expected = Value::from([
            ("host", Value::from("example.com")),
            ("port", Value::from(8080)),
            (
                "db",
                Value::from([("pool", Value::from(4)), ("debug", Value::from(false))]),
            ),
        ]);
        assert_eq!(cfg.to_basic().unwrap(), expected);
    }

    #[test]
    fn test_load_from_basic() {
        let cfg = server_schema().instantiate();
        cfg.load_from_basic(Value::from([
            ("port", Value::from("1234")),
            ("db", Value::from([("pool", 2)])),
        ]))
        .unwrap();

        assert_eq!(cfg.get("port").unwrap(), 1234);
        assert_eq!(cfg.get_path("db.pool").unwrap(), 2);
        assert_eq!(cfg.get("host").unwrap(), "localhost");
    }

    #[test]
    fn test_load_from_basic_rejects_non_map() {
        let cfg = server_schema().instantiate();
        assert!(matches!(
            cfg.load_from_basic(Value::from(1)),
            Err(ConfigError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_load_from_basic_unknown_key() {
        let cfg = server_schema().instantiate();
        let result = cfg.load_from_basic(Value::from([("bogus", 1)]));
        assert!(matches!(result, Err(ConfigError::UnknownKey { .. })));
    }

    #[test]
    fn test_failed_load_keeps_previous_values() {
        let schema = Schema::new();
        schema.field("name", AnyField::new().default("web")).unwrap();
        schema.field("port", IntField::port()).unwrap();
        let cfg = schema.instantiate();

        let result = cfg.load_from_basic(Value::from([
            ("name", Value::from("changed")),
            ("port", Value::from(0)),
        ]));

        assert!(matches!(result, Err(ConfigError::Validation { .. })));
        assert_eq!(cfg.get("name").unwrap(), "web");
        assert!(cfg.get("port").unwrap().is_null());
    }

    #[test]
    fn test_failed_load_restores_nested() {
        let cfg = server_schema().instantiate();
        let db = cfg.nested("db").unwrap();
        db.set("pool", 8).unwrap();
        cfg.set("port", 9000).unwrap();

        let result = cfg.load_from_basic(Value::from([
            ("port", Value::from(9100)),
            ("db", Value::from([("pool", Value::from(2)), ("debug", Value::from("maybe"))])),
        ]));

        assert!(result.is_err());
        assert_eq!(cfg.get("port").unwrap(), 9000);
        assert_eq!(db.get("pool").unwrap(), 8);
        assert!(cfg.nested("db").unwrap().ptr_eq(&db));
    }

    #[test]
    fn test_failed_validation_after_load_restores() {
        let schema = Schema::new();
        schema.field("low", IntField::new().default(1)).unwrap();
        schema.field("high", IntField::new().default(10)).unwrap();
        schema.validator(|cfg| {
            let low = cfg.get("low")?.as_int().unwrap_or_default();
            let high = cfg.get("high")?.as_int().unwrap_or_default();
            if low > high {
                return Err(ConfigError::validation("low", "must not exceed high"));
            }
            Ok(())
        });
        let cfg = schema.instantiate();
        cfg.set("low", 5).unwrap();

        let result = cfg.load_from_basic(Value::from([("low", 20)]));

        assert_eq!(result, Err(ConfigError::validation("low", "must not exceed high")));
        assert_eq!(cfg.get("low").unwrap(), 5);
    }

    #[test]
    fn test_dynamic_set_declares_any_field() {
        let cfg = Schema::dynamic().instantiate();
        cfg.set("x", 2).unwrap();

        assert_eq!(cfg.get("x").unwrap(), 2);
        assert_eq!(cfg.field("x").unwrap().kind(), "any");
        assert_eq!(cfg.dynamic_keys(), vec!["x"]);
        assert!(cfg.schema().get("x").is_none());
    }

    #[test]
    fn test_dynamic_get_unknown_is_null() {
        let cfg = Schema::dynamic().instantiate();
        assert!(cfg.get("x").unwrap().is_null());
        assert!(cfg.dynamic_keys().is_empty());
    }

    #[test]
    fn test_dynamic_keys_are_per_config() {
        let schema = Schema::dynamic();
        let first = schema.instantiate();
        let second = schema.instantiate();
        first.set("x", 1).unwrap();

        assert!(second.field("x").is_none());
        assert!(second.get("x").unwrap().is_null());
    }

    #[test]
    fn test_dynamic_rejects_bad_name() {
        let cfg = Schema::dynamic().instantiate();
        assert!(matches!(cfg.set("a.b", 1), Err(ConfigError::Type { .. })));
    }

    #[test]
    fn test_dynamic_to_basic_and_iter() {
        let schema = Schema::dynamic();
        schema.field("x", AnyField::new().default(2)).unwrap();
        schema.schema("blah").unwrap().field("y", AnyField::new().default(3)).unwrap();
        let cfg = schema.instantiate();
        cfg.set("z", 4).unwrap();

        assert_eq!(
            cfg.to_basic().unwrap(),
            Value::from([
                ("x", Value::from(2)),
                ("blah", Value::from([("y", 3)])),
                ("z", Value::from(4)),
            ])
        );

        let items: Vec<(String, FieldValue)> = cfg.iter().unwrap().collect();
        let keys: Vec<&str> = items.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["x", "blah", "z"]);
        assert_eq!(items[0].1, 2);
        assert!(items[1].1.as_config().unwrap().ptr_eq(&cfg.nested("blah").unwrap()));
        assert_eq!(items[2].1, 4);
    }

    #[test]
    fn test_dynamic_load_from_basic() {
        let cfg = Schema::dynamic().instantiate();
        cfg.load_from_basic(Value::from([("extra", "value")])).unwrap();
        assert_eq!(cfg.get("extra").unwrap(), "value");
        assert_eq!(cfg.to_basic().unwrap(), Value::from([("extra", "value")]));
    }

    #[test]
    fn test_failed_dynamic_load_forgets_new_keys() {
        let schema = Schema::dynamic();
        schema.field("port", IntField::port()).unwrap();
        let cfg = schema.instantiate();

        let result = cfg.load_from_basic(Value::from([
            ("extra", Value::from(1)),
            ("port", Value::from(0)),
        ]));

        assert!(result.is_err());
        assert!(cfg.field("extra").is_none());
        assert!(cfg.get("extra").unwrap().is_null());
    }

    #[test]
    fn test_iter_skips_computed_fields() {
        let schema = Schema::new();
        schema.field("port", IntField::new().default(80)).unwrap();
        schema
            .field("double", VirtualField::new(|cfg| cfg.get("port")))
            .unwrap();
        let cfg = schema.instantiate();

        let keys: Vec<String> = cfg.iter().unwrap().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["port"]);
    }

    #[test]
    fn test_validate_required() {
        let schema = Schema::new();
        schema.field("token", AnyField::new().required()).unwrap();
        let cfg = schema.instantiate();

        assert!(matches!(cfg.validate(), Err(ConfigError::Validation { .. })));
        cfg.set("token", "abc").unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_schema_validator_runs() {
        let schema = Schema::new();
        schema.field("low", IntField::new().default(1)).unwrap();
        schema.field("high", IntField::new().default(10)).unwrap();
        schema.validator(|cfg| {
            let low = cfg.get("low")?.as_int().unwrap_or_default();
            let high = cfg.get("high")?.as_int().unwrap_or_default();
            if low > high {
                return Err(ConfigError::validation("low", "must not exceed high"));
            }
            Ok(())
        });

        let cfg = schema.instantiate();
        assert!(cfg.validate().is_ok());
        cfg.set("low", 20).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_virtual_field_skipped_in_basic() {
        let schema = Schema::new();
        schema.field("port", IntField::new().default(80)).unwrap();
        schema
            .field(
                "is_privileged",
                VirtualField::new(|cfg| {
                    let port = cfg.get("port")?.as_int().unwrap_or_default();
                    Ok(FieldValue::from(port < 1024))
                }),
            )
            .unwrap();

        let cfg = schema.instantiate();
        assert_eq!(cfg.get("is_privileged").unwrap(), true);
        assert_eq!(cfg.to_basic().unwrap(), Value::from([("port", 80)]));
        assert!(cfg.set("is_privileged", false).is_err());
    }

    #[test]
    fn test_list_accessor() {
        let schema = Schema::new();
        schema.field("ports", ListField::new(IntField::new())).unwrap();
        schema.field("name", AnyField::new()).unwrap();
        let cfg = schema.instantiate();

        cfg.list("ports").unwrap().append("80").unwrap();
        assert_eq!(cfg.list("ports").unwrap(), vec![80i64]);
        assert!(matches!(cfg.list("name"), Err(ConfigError::TypeMismatch { .. })));
    }
}
