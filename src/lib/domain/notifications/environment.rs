//! Environment snapshot used to resolve template placeholders

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Only variables whose name starts with this prefix are exposed to templates
pub const ENVIRONMENT_PREFIX: &str = "VELA_";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z UTC";

/// A source of environment variables
pub trait EnvironmentSource {
    /// Returns every `(name, value)` pair visible to this source.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The variables of the running process
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSource for ProcessEnvironment {
    fn vars(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }
}

/// A list of raw `KEY=VALUE` assignments, as found in an `environ` block
#[derive(Clone, Debug, Default)]
pub struct Environ(Vec<String>);

impl Environ {
    /// Create a source from raw assignments
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }
}

impl<S: Into<String>> FromIterator<S> for Environ {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl EnvironmentSource for Environ {
    fn vars(&self) -> Vec<(String, String)> {
        // values may contain '=' themselves
        self.0
            .iter()
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), value.to_string()),
                None => (entry.clone(), String::new()),
            })
            .collect()
    }
}

/// Build timestamps as Unix epoch seconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildTimestamps {
    /// When the build was created
    pub created: i64,

    /// When the build was enqueued
    pub enqueued: i64,

    /// When the build finished
    pub finished: i64,

    /// When the build started
    pub started: i64,
}

/// Human-readable build timestamps
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildEnv {
    /// When the build was created
    pub created: String,

    /// When the build was enqueued
    pub enqueued: String,

    /// When the build finished
    pub finished: String,

    /// When the build started
    pub started: String,
}

impl From<BuildTimestamps> for BuildEnv {
    fn from(timestamps: BuildTimestamps) -> Self {
        Self {
            created: readable(timestamps.created),
            enqueued: readable(timestamps.enqueued),
            finished: readable(timestamps.finished),
            started: readable(timestamps.started),
        }
    }
}

fn readable(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Lookup table of template variables for a single run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvironmentTable(BTreeMap<String, String>);

impl EnvironmentTable {
    /// Captures every prefixed variable from `source`, then adds the readable build
    /// timestamps. The timestamps win over any variable with the same name.
    pub fn capture(source: &impl EnvironmentSource, build: &BuildEnv) -> Self {
        let mut table: BTreeMap<String, String> = source
            .vars()
            .into_iter()
            .filter(|(key, _)| key.starts_with(ENVIRONMENT_PREFIX))
            .collect();

        table.insert("BuildCreated".to_string(), build.created.clone());
        table.insert("BuildEnqueued".to_string(), build.enqueued.clone());
        table.insert("BuildFinished".to_string(), build.finished.clone());
        table.insert("BuildStarted".to_string(), build.started.clone());

        Self(table)
    }

    /// Looks up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of variables in the table
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvironmentTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
