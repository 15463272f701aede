use crate::config::{Config, WeakConfig};
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::value::{FieldValue, Value};
use indexmap::IndexMap;
use std::{fmt, rc::Rc};

/// Function behind an `InstanceMethodField`; receives the owning config first
pub type MethodFn = dyn Fn(&Config, &CallArgs) -> Result<FieldValue, ConfigError>;

/// Positional and keyword arguments passed to a bound method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Positional argument `index`, or the keyword argument `name` when not given positionally
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional(index).or_else(|| self.keyword(name))
    }
}

/// A method field's function bound to one config
#[derive(Clone)]
pub struct BoundMethod {
    name: Rc<str>,
    cfg: WeakConfig,
    func: Rc<MethodFn>,
}

impl BoundMethod {
    /// Name of the wrapped method
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> Option<Config> {
        self.cfg.upgrade()
    }

    /// Calls the method as `func(cfg, args)`
    pub fn call(&self, args: CallArgs) -> Result<FieldValue, ConfigError> {
        let cfg = self.cfg.upgrade().ok_or(ConfigError::Detached)?;
        (self.func)(&cfg, &args)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundMethod({})", self.name)
    }
}

/// Exposes a function bound to the owning config; never stored or serialized
#[derive(Clone)]
pub struct InstanceMethodField {
    base: FieldBase,
    method_name: Rc<str>,
    func: Rc<MethodFn>,
}

impl InstanceMethodField {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Config, &CallArgs) -> Result<FieldValue, ConfigError> + 'static,
    {
        Self {
            base: FieldBase::default(),
            method_name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    /// Like `new`, with options; a default is rejected since methods have none
    pub fn with_options<F>(name: &str, func: F, options: FieldOptions) -> Result<Self, ConfigError>
    where
        F: Fn(&Config, &CallArgs) -> Result<FieldValue, ConfigError> + 'static,
    {
        if options.default.is_some() {
            return Err(ConfigError::type_error(
                name,
                "methods do not accept a default value",
            ));
        }
        Ok(Self {
            base: FieldBase::new(options),
            ..Self::new(name, func)
        })
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }
}

impl fmt::Debug for InstanceMethodField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceMethodField")
            .field("method", &self.method_name)
            .field("key", &self.base.key())
            .finish()
    }
}

impl Field for InstanceMethodField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "method".to_string()
    }

    fn is_data(&self) -> bool {
        false
    }

    fn set_default(&self, _cfg: &Config) -> Result<(), ConfigError> {
        Ok(())
    }

    fn get_value(&self, cfg: &Config) -> Result<FieldValue, ConfigError> {
        Ok(FieldValue::Method(BoundMethod {
            name: self.method_name.clone(),
            cfg: cfg.downgrade(),
            func: self.func.clone(),
        }))
    }

    fn set_value(&self, _cfg: &Config, _value: FieldValue) -> Result<(), ConfigError> {
        Err(ConfigError::type_error(self.name(), "is read-only"))
    }

    fn to_basic(&self, _cfg: &Config, _value: &FieldValue) -> Result<Value, ConfigError> {
        Ok(Value::Null)
    }
}
