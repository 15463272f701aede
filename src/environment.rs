use crate::config::Config;
use crate::error::ConfigError;
use crate::schema::SchemaEntry;
use indexmap::IndexMap;
use std::{env, path::Path};

/// Environment variable name for a field path: `PREFIX_DB_POOL` for `db.pool`
pub fn env_var_name(prefix: &str, path: &[&str]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(path.len() + 1);
    if !prefix.is_empty() {
        parts.push(prefix.trim_end_matches('_'));
    }
    parts.extend(path.iter().copied());
    parts.join("_").to_uppercase()
}

/// Overrides field values from environment variables
///
/// Every data field (nested ones included) is looked up under its
/// [`env_var_name`]. Present variables go through the field's `parse_str` and a
/// regular validated assignment. All failures are collected; fields that fail keep
/// their previous value.
///
/// Returns the number of fields that were overridden.
pub fn apply_env(cfg: &Config, prefix: &str) -> Result<usize, Vec<ConfigError>> {
    apply_vars(cfg, prefix, |name| env::var(name).ok())
}

/// Like [`apply_env`], also reading variables from a dotenv file
///
/// Variables already present in the process environment win over the file, and
/// the process environment is left untouched.
pub fn apply_env_file(
    cfg: &Config,
    path: impl AsRef<Path>,
    prefix: &str,
) -> Result<usize, Vec<ConfigError>> {
    let path = path.as_ref();
    let file_vars = dotenvy::from_path_iter(path)
        .and_then(|iter| iter.collect::<Result<IndexMap<String, String>, _>>())
        .map_err(|e| {
            vec![ConfigError::Format {
                message: format!("{}: {}", path.display(), e),
            }]
        })?;
    tracing::debug!(path = %path.display(), count = file_vars.len(), "read env file");

    apply_vars(cfg, prefix, |name| {
        env::var(name).ok().or_else(|| file_vars.get(name).cloned())
    })
}

/// Overrides field values from any variable source
pub fn apply_vars<F>(cfg: &Config, prefix: &str, lookup: F) -> Result<usize, Vec<ConfigError>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let applied = walk(cfg, prefix, &mut Vec::new(), &lookup, &mut errors);
    if errors.is_empty() {
        Ok(applied)
    } else {
        Err(errors)
    }
}

fn walk<F>(
    cfg: &Config,
    prefix: &str,
    path: &mut Vec<String>,
    lookup: &F,
    errors: &mut Vec<ConfigError>,
) -> usize
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for (key, entry) in cfg.schema().iter() {
        path.push(key.clone());
        match entry {
            SchemaEntry::Schema(_) => match cfg.nested(&key) {
                Ok(child) => applied += walk(&child, prefix, path, lookup, errors),
                Err(e) => errors.push(e),
            },
            SchemaEntry::Field(field) if field.is_data() => {
                let parts: Vec<&str> = path.iter().map(String::as_str).collect();
                let var = env_var_name(prefix, &parts);
                if let Some(raw) = lookup(&var) {
                    match cfg.set(&key, field.parse_str(&raw)) {
                        Ok(()) => {
                            tracing::debug!(var = %var, key = %key, "applied environment override");
                            applied += 1;
                        }
                        Err(e) => errors.push(ConfigError::InvalidEnvironment {
                            key: var,
                            value: raw,
                            description: match e {
                                ConfigError::Validation { message, .. } => {
                                    format!("{} {}", field.name(), message)
                                }
                                other => other.to_string(),
                            },
                            example: field
                                .default_value()
                                .filter(|value| !value.is_null())
                                .map(|value| value.to_string()),
                        }),
                    }
                }
            }
            SchemaEntry::Field(_) => {}
        }
        path.pop();
    }
    applied
}
