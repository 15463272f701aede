use crate::config::Config;
use crate::error::ConfigError;
use crate::field::Field;
use crate::value::{FieldValue, Value};
use indexmap::IndexMap;
use std::{
    cell::{OnceCell, RefCell},
    fmt, fs,
    path::Path,
    rc::Rc,
};

/// Check run against a whole config by `Config::validate`
pub type SchemaValidator = Rc<dyn Fn(&Config) -> Result<(), ConfigError>>;

/// One declared key of a schema: a field or a nested schema
#[derive(Debug, Clone)]
pub enum SchemaEntry {
    Field(Rc<dyn Field>),
    Schema(Schema),
}

impl SchemaEntry {
    pub fn as_field(&self) -> Option<&Rc<dyn Field>> {
        match self {
            SchemaEntry::Field(field) => Some(field),
            SchemaEntry::Schema(_) => None,
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaEntry::Schema(schema) => Some(schema),
            SchemaEntry::Field(_) => None,
        }
    }

    /// Identity comparison: same field object or same schema object
    pub fn ptr_eq(&self, other: &SchemaEntry) -> bool {
        match (self, other) {
            (SchemaEntry::Field(a), SchemaEntry::Field(b)) => Rc::ptr_eq(a, b),
            (SchemaEntry::Schema(a), SchemaEntry::Schema(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

struct SchemaInner {
    key: OnceCell<String>,
    dynamic: bool,
    entries: RefCell<IndexMap<String, SchemaEntry>>,
    validators: RefCell<Vec<SchemaValidator>>,
}

/// A declared tree of fields and nested schemas
///
/// `Schema` is a shared handle: clones refer to the same declaration. Declare
/// everything before instantiating configs; changing a schema that already has
/// configs is not supported.
///
/// ```rust
/// use config_schema::{IntField, Schema};
///
/// let schema = Schema::new();
/// schema.field("port", IntField::port().default(8080)).unwrap();
/// schema.schema("db").unwrap().field("pool", IntField::new().default(4)).unwrap();
///
/// let cfg = schema.instantiate();
/// assert_eq!(cfg.get("port").unwrap(), 8080);
/// ```
#[derive(Clone)]
pub struct Schema {
    inner: Rc<SchemaInner>,
}

impl Schema {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// A schema whose configs also accept undeclared keys
    ///
    /// Assigning an unknown key declares an `AnyField` on that config only, and
    /// reading an unknown key yields null. Nested schemas are not dynamic.
    pub fn dynamic() -> Self {
        Self::build(true)
    }

    fn build(dynamic: bool) -> Self {
        Self {
            inner: Rc::new(SchemaInner {
                key: OnceCell::new(),
                dynamic,
                entries: RefCell::new(IndexMap::new()),
                validators: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        self.inner.dynamic
    }

    /// Key under which this schema is nested in its parent, if any
    pub fn key(&self) -> Option<&str> {
        self.inner.key.get().map(String::as_str)
    }

    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declares a field under `name` and returns the installed field
    pub fn field<F: Field + 'static>(&self, name: &str, field: F) -> Result<Rc<dyn Field>, ConfigError> {
        self.add_field(name, Rc::new(field))
    }

    /// Declares an already shared field under `name`
    pub fn add_field(&self, name: &str, field: Rc<dyn Field>) -> Result<Rc<dyn Field>, ConfigError> {
        check_name(name)?;
        if self.inner.entries.borrow().contains_key(name) {
            return Err(ConfigError::type_error(name, "is already declared"));
        }

        // Binding may register helper fields, so no borrow is held here.
        field.bind_key(self, name)?;
        self.inner
            .entries
            .borrow_mut()
            .insert(name.to_string(), SchemaEntry::Field(field.clone()));
        tracing::debug!(key = name, kind = %field.kind(), "declared field");
        Ok(field)
    }

    /// Returns the nested schema under `name`, creating an empty one on first reference
    pub fn schema(&self, name: &str) -> Result<Schema, ConfigError> {
        check_name(name)?;
        if let Some(entry) = self.get(name) {
            return match entry {
                SchemaEntry::Schema(schema) => Ok(schema),
                SchemaEntry::Field(_) => Err(ConfigError::type_error(
                    name,
                    "is declared as a field, not a nested schema",
                )),
            };
        }

        let child = Schema::new();
        let _ = child.inner.key.set(name.to_string());
        self.inner
            .entries
            .borrow_mut()
            .insert(name.to_string(), SchemaEntry::Schema(child.clone()));
        tracing::debug!(key = name, "created nested schema");
        Ok(child)
    }

    pub fn get(&self, name: &str) -> Option<SchemaEntry> {
        self.inner.entries.borrow().get(name).cloned()
    }

    pub fn get_field(&self, name: &str) -> Option<Rc<dyn Field>> {
        self.get(name).and_then(|entry| entry.as_field().cloned())
    }

    /// Top-level entries in first-reference order; nested schemas are single entries
    pub fn iter(&self) -> std::vec::IntoIter<(String, SchemaEntry)> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Registers a whole-config check run by `Config::validate`
    pub fn validator<F>(&self, validator: F)
    where
        F: Fn(&Config) -> Result<(), ConfigError> + 'static,
    {
        self.inner.validators.borrow_mut().push(Rc::new(validator));
    }

    pub(crate) fn validators(&self) -> Vec<SchemaValidator> {
        self.inner.validators.borrow().clone()
    }

    /// Creates a top-level config with a fresh store
    pub fn instantiate(&self) -> Config {
        Config::new(self, None)
    }

    /// Creates a config nested under `parent`
    pub fn instantiate_in(&self, parent: &Config) -> Config {
        Config::new(self, Some(parent))
    }

    /// Resolves a value offered to a slot typed by this schema
    ///
    /// A config of this exact schema is adopted in place with its parent re-pointed
    /// to `owner`. A mapping builds a new config under `owner`, leaving absent keys
    /// at their defaults.
    pub fn coerce(&self, owner: &Config, value: FieldValue) -> Result<Config, ConfigError> {
        match value {
            FieldValue::Config(cfg) if cfg.schema().ptr_eq(self) => {
                cfg.set_parent(Some(owner));
                Ok(cfg)
            }
            FieldValue::Basic(Value::Map(map)) => {
                let cfg = self.instantiate_in(owner);
                for (key, item) in map {
                    cfg.set(&key, item)?;
                }
                Ok(cfg)
            }
            other => Err(ConfigError::TypeMismatch {
                key: self.key().unwrap_or("item").to_string(),
                expected: "config or mapping".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Renders a markdown table of every data field, nested keys joined by dots
    pub fn docs(&self) -> String {
        let mut md = String::new();

        md.push_str("## Configuration Summary\n\n");
        md.push_str("| Key | Type | Required | Default | Description |\n");
        md.push_str("|-----|------|----------|---------|-------------|\n");
        self.push_doc_rows("", &mut md);
        md
    }

    /// Write configuration documentation to a markdown file
    pub fn write_docs(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        fs::write(path, self.docs())
    }

    fn push_doc_rows(&self, prefix: &str, md: &mut String) {
        for (key, entry) in self.iter() {
            let path = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };
            match entry {
                SchemaEntry::Schema(schema) => schema.push_doc_rows(&path, md),
                SchemaEntry::Field(field) if field.is_data() => {
                    let required_str = if field.is_required() { "Yes" } else { "No" };
                    let default_display = match field.default_value() {
                        Some(value) if !value.is_null() => value.to_string(),
                        _ => "-".to_string(),
                    };
                    let description = field.base().options().description.as_deref().unwrap_or("");
                    md.push_str(&format!(
                        "| {} | {} | {} | {} | {} |\n",
                        path,
                        field.kind(),
                        required_str,
                        default_display,
                        description
                    ));
                }
                SchemaEntry::Field(_) => {}
            }
        }
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.inner.entries.borrow().keys().cloned().collect();
        f.debug_struct("Schema")
            .field("key", &self.key())
            .field("dynamic", &self.is_dynamic())
            .field("entries", &keys)
            .finish()
    }
}

impl IntoIterator for &Schema {
    type Item = (String, SchemaEntry);
    type IntoIter = std::vec::IntoIter<(String, SchemaEntry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub(crate) fn check_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.contains('.') {
        return Err(ConfigError::type_error(
            name,
            "is not a valid key (must be non-empty and contain no '.')",
        ));
    }
    Ok(())
}
