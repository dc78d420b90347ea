//! Domain entities: core data structures

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

/// Field paths a service config must provide.
pub const SERVICE_NAME_FIELD: &str = "service.name";
pub const DATABASE_NAME_FIELD: &str = "database.name";
pub const DATABASE_USER_FIELD: &str = "database.user";

/// Identifiers PostgreSQL keeps as written when unquoted.
static PLAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_][a-z0-9_$]*$").expect("identifier pattern"));

/// Database provisioning data for one service directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Directory the config was read from
    pub dir: PathBuf,
    /// `service.name`
    pub name: String,
    /// `database.name`
    pub database: String,
    /// `database.user`
    pub user: String,
}

impl ServiceDescriptor {
    /// Extract the required fields from a parsed service config.
    ///
    /// Lookups default to absent: a missing section, a missing key, a null,
    /// a non-scalar, a blank value, `0` or `false` all count as missing. Every missing
    /// field is reported, not just the first one.
    pub fn from_config(dir: PathBuf, config: &Value) -> Result<Self, MissingFields> {
        let name = lookup(config, "service", "name");
        let database = lookup(config, "database", "name");
        let user = lookup(config, "database", "user");

        match (name, database, user) {
            (Some(name), Some(database), Some(user)) => Ok(Self {
                dir,
                name,
                database,
                user,
            }),
            (name, database, user) => {
                let fields = [
                    (SERVICE_NAME_FIELD, name.is_none()),
                    (DATABASE_NAME_FIELD, database.is_none()),
                    (DATABASE_USER_FIELD, user.is_none()),
                ]
                .into_iter()
                .filter_map(|(field, missing)| missing.then_some(field))
                .collect();
                Err(MissingFields { dir, fields })
            }
        }
    }

    /// Name of the password variable in the database container's env file.
    ///
    /// `auth` → `AUTH_DB_PASSWORD`
    pub fn password_var(&self) -> String {
        format!("{}_DB_PASSWORD", self.name.to_uppercase())
    }

    /// Identifier fields PostgreSQL would fold or reject when unquoted.
    pub fn unusual_identifiers(&self) -> Vec<(&'static str, &str)> {
        [
            (DATABASE_NAME_FIELD, self.database.as_str()),
            (DATABASE_USER_FIELD, self.user.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !PLAIN_IDENTIFIER.is_match(value))
        .collect()
    }
}

/// Look up `section.field` and render scalars as strings.
///
/// Falsy scalars (`0`, `false`) count as missing.
fn lookup(config: &Value, section: &str, field: &str) -> Option<String> {
    let value = config.get(section)?.get(field)?;
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => return None,
    };
    if rendered.trim().is_empty() {
        None
    } else {
        Some(rendered)
    }
}

/// A service config that lacks one or more required fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFields {
    pub dir: PathBuf,
    pub fields: Vec<&'static str>,
}

/// A directory with a config file that was left out of the output.
pub type SkippedService = MissingFields;

/// A single secret read from a key-value file.
///
/// `Debug` never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue {
    pub key: String,
    value: String,
}

impl SecretValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Find `key` in key-value file content.
    ///
    /// A line matches when it starts with `KEY=`; the first match wins, even
    /// if its value is empty. The value is everything after the first `=` of
    /// the trimmed line with surrounding `"` and then `'` characters removed.
    pub fn find(content: &str, key: &str) -> Option<Self> {
        let prefix = format!("{key}=");
        content
            .lines()
            .find(|line| line.starts_with(&prefix))
            .and_then(|line| line.trim().split_once('='))
            .map(|(_, raw)| Self::new(key, raw.trim_matches('"').trim_matches('\'')))
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("key", &self.key)
            .field("value", &"***")
            .finish()
    }
}

/// Append-only sequence of output lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    lines: Vec<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    /// Lines joined with `\n`.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
