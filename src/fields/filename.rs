use crate::config::Config;
use crate::error::ConfigError;
use crate::field::{Field, FieldBase, FieldOptions};
use crate::fields::string::expect_str;
use crate::value::{FieldValue, Value};
use std::path::{Path, PathBuf};

/// Existence requirement checked by [`FilenameField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exists {
    /// A file or directory must exist
    Exists,
    /// Nothing may exist at the path
    Missing,
    Dir,
    File,
}

/// Path on disk, optionally resolved against a start directory
#[derive(Debug, Clone)]
pub struct FilenameField {
    base: FieldBase,
    exists: Option<Exists>,
    startdir: Option<PathBuf>,
}

impl FilenameField {
    pub fn new() -> Self {
        Self::with_options(FieldOptions::default())
    }

    pub fn with_options(options: FieldOptions) -> Self {
        Self {
            base: FieldBase::new(options),
            exists: None,
            startdir: None,
        }
    }

    pub fn exists(mut self, exists: Exists) -> Self {
        self.exists = Some(exists);
        self
    }

    /// Relative paths are joined onto `dir`
    pub fn startdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.startdir = Some(dir.into());
        self
    }

    fn check(&self, path: &Path) -> Result<(), ConfigError> {
        let found = path.exists();
        let problem = match self.exists {
            Some(Exists::Exists) if !found => Some("file or directory does not exist"),
            Some(Exists::Missing) if found => Some("file or directory already exists"),
            Some(Exists::Dir) if !path.is_dir() => Some(if found {
                "is not a directory"
            } else {
                "directory does not exist"
            }),
            Some(Exists::File) if !path.is_file() => Some(if found {
                "is not a file"
            } else {
                "file does not exist"
            }),
            _ => None,
        };
        match problem {
            Some(message) => Err(ConfigError::validation(self.name(), message)),
            None => Ok(()),
        }
    }
}

impl_field_options!(FilenameField);

impl Field for FilenameField {
    fn base(&self) -> &FieldBase {
        &self.base
    }

    fn kind(&self) -> String {
        "path".to_string()
    }

    fn validate_value(&self, _cfg: &Config, value: FieldValue) -> Result<FieldValue, ConfigError> {
        let text = expect_str(self.name(), &value)?;
        let path = match &self.startdir {
            Some(dir) if Path::new(text).is_relative() => dir.join(text),
            _ => PathBuf::from(text),
        };
        self.check(&path)?;
        Ok(FieldValue::Basic(Value::String(path.to_string_lossy().into_owned())))
    }
}
