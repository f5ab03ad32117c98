//! Alternative environment variable names for plugin parameters

use std::collections::HashMap;

use crate::domain::notifications::{EnvironmentSource, ProcessEnvironment};

/// `(primary, alias)` pairs. An alias is read only while its primary is unset or empty.
pub const ALIASES: &[(&str, &str)] = &[
    ("PARAMETER_LOG_LEVEL", "EMAIL_LOG_LEVEL"),
    ("PARAMETER_FROM", "EMAIL_FROM"),
    ("PARAMETER_SENDER", "EMAIL_SENDER"),
    ("PARAMETER_REPLYTO", "EMAIL_REPLYTO"),
    ("PARAMETER_TO", "EMAIL_TO"),
    ("PARAMETER_CC", "EMAIL_CC"),
    ("PARAMETER_BCC", "EMAIL_BCC"),
    ("PARAMETER_SUBJECT", "EMAIL_SUBJECT"),
    ("PARAMETER_TEXT", "EMAIL_TEXT"),
    ("PARAMETER_HTML", "EMAIL_HTML"),
    ("PARAMETER_READRECEIPT", "EMAIL_READRECEIPT"),
    ("PARAMETER_ATTACHMENT", "EMAIL_ATTACHMENT"),
    ("PARAMETER_FILENAME", "EMAIL_FILENAME"),
    ("PARAMETER_HOST", "EMAIL_HOST"),
    ("PARAMETER_PORT", "EMAIL_PORT"),
    ("PARAMETER_USERNAME", "USERNAME"),
    ("PARAMETER_PASSWORD", "PASSWORD"),
    ("PARAMETER_SKIPVERIFY", "EMAIL_SKIPVERIFY"),
    ("PARAMETER_SENDTYPE", "EMAIL_SENDTYPE"),
    ("PARAMETER_AUTH", "EMAIL_AUTH"),
    ("VELA_BUILD_CREATED", "BUILD_CREATED"),
    ("VELA_BUILD_ENQUEUED", "BUILD_ENQUEUED"),
    ("VELA_BUILD_FINISHED", "BUILD_FINISHED"),
    ("VELA_BUILD_STARTED", "BUILD_STARTED"),
];

/// The primaries to set from their aliases, given the variables in `source`
pub fn resolve(source: &impl EnvironmentSource) -> Vec<(&'static str, String)> {
    let vars: HashMap<String, String> = source
        .vars()
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

    ALIASES
        .iter()
        .filter(|(primary, _)| !vars.contains_key(*primary))
        .filter_map(|(primary, alias)| vars.get(*alias).map(|value| (*primary, value.clone())))
        .collect()
}

/// Exports aliased values under their primary names, before arguments are parsed
#[mutants::skip]
pub fn apply() {
    for (primary, value) in resolve(&ProcessEnvironment) {
        std::env::set_var(primary, value);
    }
}
