#[macro_use]
mod macros;

pub mod config;
pub mod environment;
pub mod error;
pub mod field;
pub mod fields;
#[cfg(feature = "serde")]
pub mod format;
pub mod schema;
pub mod value;

// Re-export main types
pub use config::{Config, WeakConfig};
pub use environment::{apply_env, apply_env_file, apply_vars, env_var_name};
pub use error::{format_config_errors, ConfigError};
pub use field::{AnyField, DefaultValue, Field, FieldBase, FieldOptions, Validator};
pub use fields::{
    ApplicationModeField, BoolField, BoundMethod, BytesField, CallArgs, Case, DictField,
    Encoding, Exists, FilenameField, FloatField, HostnameField, IPv4AddressField,
    IPv4NetworkField, InstanceMethodField, IntField, ItemValidator, ListField, ListProxy,
    StringField, Strip, UrlField, VirtualField,
};
pub use schema::{Schema, SchemaEntry, SchemaValidator};
pub use value::{FieldValue, Value};
