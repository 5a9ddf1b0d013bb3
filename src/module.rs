//! Module references
//!
//! Modules are addressed as `namespace:name@vX.Y.Z`, optionally followed by a
//! pre-release suffix made of `-segment` parts (`story:character@v1.2.0-beta-2`).

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

pub const VERSION_SEPARATOR: char = '@';
pub const NAMESPACE_SEPARATOR: char = ':';

const NAME_PATTERN: &str = r"[a-z0-9]+(-[a-z0-9]+)*";
const VERSION_PATTERN: &str = r"[0-9]+\.[0-9]+\.[0-9]+";
const PREVERSION_PATTERN: &str = r"(-[a-z0-9]+)*";

static NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{NAME_PATTERN}$")).expect("valid name pattern"));

static MODULE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "^(?P<namespace>{NAME_PATTERN}){NAMESPACE_SEPARATOR}(?P<module>{NAME_PATTERN})\
         {VERSION_SEPARATOR}v(?P<version>{VERSION_PATTERN})(?P<preversion>{PREVERSION_PATTERN})$"
    ))
    .expect("valid module pattern")
});

/// A decoded module reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    pub namespace: String,
    pub module: String,
    /// `X.Y.Z`, without the leading `v`
    pub version: String,
    /// Pre-release suffix including its leading `-`, or empty
    pub preversion: String,
}

impl ModuleRef {
    pub fn new(namespace: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            module: module.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>, preversion: impl Into<String>) -> Self {
        self.version = version.into();
        self.preversion = preversion.into();
        self
    }

    /// Decode a module string. Strings that do not match the grammar decode
    /// to an empty reference.
    pub fn decode(value: &str) -> Self {
        let Some(captures) = MODULE_REGEX.captures(value) else {
            return Self::default();
        };

        let group = |name: &str| {
            captures
                .name(name)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        Self {
            namespace: group("namespace"),
            module: group("module"),
            version: group("version"),
            preversion: group("preversion"),
        }
    }

    /// Decode a module string, rejecting anything outside the grammar
    pub fn parse(value: &str) -> Result<Self> {
        if !MODULE_REGEX.is_match(value) {
            return Err(SchemaError::InvalidModule(value.to_string()));
        }
        Ok(Self::decode(value))
    }

    pub fn is_versionless(&self) -> bool {
        self.version.is_empty()
    }

    /// `namespace:name` without any version
    pub fn versionless_string(&self) -> String {
        format!("{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.module)
    }

    /// Version and pre-release as a semantic version (`1.2.0-beta-2`)
    pub fn semver(&self) -> Result<Version> {
        Ok(Version::parse(&format!("{}{}", self.version, self.preversion))?)
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.versionless_string())?;
        if !self.version.is_empty() {
            write!(f, "{}v{}{}", VERSION_SEPARATOR, self.version, self.preversion)?;
        }
        Ok(())
    }
}

/// Whether `value` is a valid module or namespace name
pub fn is_valid_name(value: &str) -> bool {
    NAME_REGEX.is_match(value)
}

/// The part of a module string before its version separator
pub fn versionless(module: &str) -> &str {
    module
        .split_once(VERSION_SEPARATOR)
        .map_or(module, |(head, _)| head)
}

/// Compare a module string against an expected one.
///
/// A versionless `expect` matches every version of the same module.
pub fn compare_modules(expect: &str, value: &str) -> bool {
    if expect.contains(VERSION_SEPARATOR) {
        value == expect
    } else {
        versionless(value) == expect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_reference() {
        let decoded = ModuleRef::decode("story:main-character@v1.2.3-beta-2");
        assert_eq!(decoded.namespace, "story");
        assert_eq!(decoded.module, "main-character");
        assert_eq!(decoded.version, "1.2.3");
        assert_eq!(decoded.preversion, "-beta-2");
    }

    #[test]
    fn test_decode_without_preversion() {
        let decoded = ModuleRef::decode("story:character@v0.1.0");
        assert_eq!(decoded, ModuleRef::new("story", "character").with_version("0.1.0", ""));
    }

    #[test]
    fn test_decode_invalid_is_empty() {
        assert_eq!(ModuleRef::decode("story:character"), ModuleRef::default());
        assert_eq!(ModuleRef::decode("Story:character@v1.0.0"), ModuleRef::default());
        assert_eq!(ModuleRef::decode("story:character@1.0.0"), ModuleRef::default());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(ModuleRef::parse("story:character@v1.0.0").is_ok());
        assert!(matches!(
            ModuleRef::parse("not a module"),
            Err(SchemaError::InvalidModule(_))
        ));
    }

    #[test]
    fn test_display() {
        let module = ModuleRef::new("story", "character");
        assert_eq!(module.to_string(), "story:character");

        let module = module.with_version("1.0.0", "-rc-1");
        assert_eq!(module.to_string(), "story:character@v1.0.0-rc-1");
        assert_eq!(ModuleRef::decode(&module.to_string()), module);
    }

    #[test]
    fn test_versionless() {
        assert_eq!(versionless("story:character@v1.0.0"), "story:character");
        assert_eq!(versionless("story:character"), "story:character");
        assert_eq!(versionless(""), "");
    }

    #[test]
    fn test_compare_modules() {
        assert!(compare_modules("story:character", "story:character@v1.0.0"));
        assert!(compare_modules("story:character", "story:character@v2.0.0-beta"));
        assert!(compare_modules("story:character@v1.0.0", "story:character@v1.0.0"));
        assert!(!compare_modules("story:character@v1.0.0", "story:character@v1.0.1"));
        assert!(!compare_modules("story:character", "story:place@v1.0.0"));
    }

    #[test]
    fn test_semver() {
        let stable = ModuleRef::decode("story:character@v1.0.0").semver().unwrap();
        let beta = ModuleRef::decode("story:character@v1.0.0-beta-1").semver().unwrap();
        assert_eq!(beta.pre.as_str(), "beta-1");
        assert!(beta < stable);

        assert!(ModuleRef::new("story", "character").semver().is_err());
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("main-character"));
        assert!(!is_valid_name("-character"));
        assert!(!is_valid_name("Character"));
    }
}
