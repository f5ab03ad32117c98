//! Parameter and secret files mounted into the plugin container

use std::{fs, path::Path};

/// Directory holding parameter files
pub const PARAMETERS_DIR: &str = "/vela/parameters/email";

/// Directory holding secret files
pub const SECRETS_DIR: &str = "/vela/secrets/email";

/// Reads `name` from the parameter directory, then from the secret directory
pub fn read_fallback(name: &str) -> Option<String> {
    read_from(&[PARAMETERS_DIR, SECRETS_DIR], name)
}

/// Returns the trimmed contents of the first non-empty file called `name` in `dirs`
pub fn read_from<P: AsRef<Path>>(dirs: &[P], name: &str) -> Option<String> {
    dirs.iter()
        .filter_map(|dir| fs::read_to_string(dir.as_ref().join(name)).ok())
        .map(|contents| contents.trim().to_string())
        .find(|contents| !contents.is_empty())
}
