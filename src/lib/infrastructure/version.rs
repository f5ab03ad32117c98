//! Version information printed when the plugin starts

use serde::Serialize;

/// Version information
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Version {
    /// Plugin name
    pub name: &'static str,

    /// Semantic version
    pub semantic: &'static str,

    /// Commit the binary was built from, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<&'static str>,

    /// Target operating system
    pub os: &'static str,

    /// Target architecture
    pub arch: &'static str,
}

impl Version {
    /// Version information of this build
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            semantic: env!("CARGO_PKG_VERSION"),
            commit: option_env!("VELA_EMAIL_COMMIT"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_version_json() -> TestResult {
        let version = Version {
            name: "vela-email",
            semantic: "0.1.0",
            commit: None,
            os: "linux",
            arch: "x86_64",
        };

        let json: serde_json::Value = serde_json::from_str(&version.to_json()?)?;

        assert_eq!(json["name"], "vela-email");
        assert_eq!(json["semantic"], "0.1.0");
        assert_eq!(json["os"], "linux");
        assert!(json.get("commit").is_none());

        Ok(())
    }

    #[test]
    fn test_current_version() {
        assert_eq!(Version::new().semantic, env!("CARGO_PKG_VERSION"));
    }
}
