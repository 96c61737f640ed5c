//! Connection configuration.
//!
//! Settings come from a key/value property source, read once when the connection is
//! first established. Only `url`, `user` and `password` matter to this crate.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DataAccessError;

/// Environment variable naming the property file used by [`ConfigSource::from_env`].
pub const PROPERTIES_ENV_VAR: &str = "DATA_ACCESS_PROPERTIES";
/// Property file used when [`PROPERTIES_ENV_VAR`] is unset.
pub const DEFAULT_PROPERTIES_FILE: &str = "data_access.properties";

pub const KEY_URL: &str = "url";
pub const KEY_USER: &str = "user";
pub const KEY_PASSWORD: &str = "password";

/// Resolved key/value settings.
///
/// Lookups never fail: a missing key (or a blank one) reads as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct DataAccessProperties {
    entries: BTreeMap<String, String>,
}

impl DataAccessProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a property file. Files ending in `.json` are read as a flat JSON object of
    /// strings, anything else as `key=value` properties text.
    ///
    /// # Errors
    /// Returns `DataAccessError::ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DataAccessError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DataAccessError::ConfigError(format!(
                "failed to read property file {}: {e}",
                path.display()
            ))
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::parse(&text)
        }
    }

    /// Parse a flat JSON object such as `{"url": "sqlite::memory:"}`.
    ///
    /// # Errors
    /// Returns `DataAccessError::ConfigError` if the text is not an object of strings.
    pub fn from_json_str(text: &str) -> Result<Self, DataAccessError> {
        serde_json::from_str(text)
            .map_err(|e| DataAccessError::ConfigError(format!("invalid JSON properties: {e}")))
    }

    /// Parse properties text: `key=value`, `key: value` or `key value` per logical line,
    /// `#`/`!` comments, backslash line continuations and escapes.
    ///
    /// # Errors
    /// Returns `DataAccessError::ConfigError` on a malformed `\u` escape.
    pub fn parse(text: &str) -> Result<Self, DataAccessError> {
        let mut props = Self::new();
        for (line_no, line) in logical_lines(text) {
            let line = line.trim_start();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = split_key_value(line);
            let key = unescape(key).map_err(|e| {
                DataAccessError::ConfigError(format!("line {line_no}: {e}"))
            })?;
            let value = unescape(value).map_err(|e| {
                DataAccessError::ConfigError(format!("line {line_no}: {e}"))
            })?;
            props.entries.insert(key, value);
        }
        Ok(props)
    }

    /// Value for `key`, or `""` when the key is blank or missing.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        if key.is_empty() {
            return "";
        }
        self.entries.get(key).map_or("", String::as_str)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join physical lines ending in an odd number of backslashes with the next line,
/// dropping the continuation backslash and the next line's leading whitespace.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;
    for (idx, raw) in text.lines().enumerate() {
        let piece = match &current {
            Some(_) => raw.trim_start(),
            None => raw,
        };
        let trailing = piece.chars().rev().take_while(|c| *c == '\\').count();
        let continues = trailing % 2 == 1;
        let piece = if continues {
            &piece[..piece.len() - 1]
        } else {
            piece
        };
        let (start, mut buf) = current.take().unwrap_or((idx + 1, String::new()));
        buf.push_str(piece);
        if continues {
            current = Some((start, buf));
        } else {
            out.push((start, buf));
        }
    }
    if let Some(last) = current {
        out.push(last);
    }
    out
}

fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }
    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("malformed \\u escape: \\u{hex}"))?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

/// Where connection settings come from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// A property file, read when the connection is first established.
    File(PathBuf),
    /// Settings already in memory.
    Resolved(DataAccessProperties),
}

impl ConfigSource {
    /// Property file named by `DATA_ACCESS_PROPERTIES`, else `data_access.properties`
    /// in the working directory.
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var_os(PROPERTIES_ENV_VAR)
            .map_or_else(|| PathBuf::from(DEFAULT_PROPERTIES_FILE), PathBuf::from);
        ConfigSource::File(path)
    }

    /// Produce the key/value settings.
    ///
    /// # Errors
    /// Returns `DataAccessError::ConfigError` if a file source is missing or malformed.
    pub fn resolve(&self) -> Result<DataAccessProperties, DataAccessError> {
        match self {
            ConfigSource::File(path) => DataAccessProperties::from_file(path),
            ConfigSource::Resolved(props) => Ok(props.clone()),
        }
    }
}

impl From<DataAccessProperties> for ConfigSource {
    fn from(props: DataAccessProperties) -> Self {
        ConfigSource::Resolved(props)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::File(path)
    }
}

/// The three settings needed to open a connection.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub url: String,
    pub user: String,
    pub password: String,
}

impl ConnectionOptions {
    #[must_use]
    pub fn from_properties(props: &DataAccessProperties) -> Self {
        Self {
            url: props.get(KEY_URL).to_owned(),
            user: props.get(KEY_USER).to_owned(),
            password: props.get(KEY_PASSWORD).to_owned(),
        }
    }

    #[must_use]
    pub fn builder(url: impl Into<String>) -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::new(url)
    }

    /// Fail early on settings that can never open a connection.
    ///
    /// # Errors
    /// Returns `DataAccessError::ConfigError` when `url` is blank.
    pub fn validate(&self) -> Result<(), DataAccessError> {
        if self.url.trim().is_empty() {
            return Err(DataAccessError::ConfigError("url is required".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fluent builder for [`ConnectionOptions`].
#[derive(Debug, Clone)]
pub struct ConnectionOptionsBuilder {
    opts: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            opts: ConnectionOptions {
                url: url.into(),
                ..ConnectionOptions::default()
            },
        }
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.opts.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = password.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectionOptions {
        self.opts
    }

    /// Settings as a resolved property source.
    #[must_use]
    pub fn into_properties(self) -> DataAccessProperties {
        DataAccessProperties::new()
            .with(KEY_URL, self.opts.url)
            .with(KEY_USER, self.opts.user)
            .with(KEY_PASSWORD, self.opts.password)
    }
}
