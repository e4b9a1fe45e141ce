use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Deployment environment a compile targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Prod,
    Local,
    Int,
}

impl Environment {
    pub const ALL: [Self; 4] = [Self::Dev, Self::Prod, Self::Local, Self::Int];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
            Self::Local => "local",
            Self::Int => "int",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment '{0}', expected one of dev, prod, local, int")]
pub struct ParseEnvironmentError(pub String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseEnvironmentError(s.to_string()))
    }
}

/// Parsed directive block of one script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    /// Only set through the builder; the block grammar has no name line.
    pub name: String,
    pub description: String,
    pub dev: EnvBlock,
    pub prod: EnvBlock,
    pub local: EnvBlock,
    pub int: EnvBlock,
}

impl Directives {
    #[must_use]
    pub const fn env(&self, env: Environment) -> &EnvBlock {
        match env {
            Environment::Dev => &self.dev,
            Environment::Prod => &self.prod,
            Environment::Local => &self.local,
            Environment::Int => &self.int,
        }
    }

    pub const fn env_mut(&mut self, env: Environment) -> &mut EnvBlock {
        match env {
            Environment::Dev => &mut self.dev,
            Environment::Prod => &mut self.prod,
            Environment::Local => &mut self.local,
            Environment::Int => &mut self.int,
        }
    }
}

/// Substitution keywords and nested references for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvBlock {
    pub keywords: BTreeMap<String, String>,
    /// Resolution order is declaration order.
    pub nested: Vec<NestedRef>,
}

impl EnvBlock {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.nested.is_empty()
    }
}

/// Where a nested fragment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSource {
    /// `sqlmfile("path")`: read from the local filesystem.
    File(String),
    /// `sqlmref("name")`: fetched through the remote lookup.
    Name(String),
}

/// A placeholder key bound to another script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedRef {
    pub key: String,
    pub source: RefSource,
}

impl NestedRef {
    #[must_use]
    pub fn file(key: &str, path: &str) -> Self {
        Self {
            key: key.to_string(),
            source: RefSource::File(path.to_string()),
        }
    }

    #[must_use]
    pub fn name(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            source: RefSource::Name(name.to_string()),
        }
    }

    #[must_use]
    pub fn file_ref(&self) -> Option<&str> {
        match &self.source {
            RefSource::File(path) => Some(path),
            RefSource::Name(_) => None,
        }
    }

    #[must_use]
    pub fn name_ref(&self) -> Option<&str> {
        match &self.source {
            RefSource::Name(name) => Some(name),
            RefSource::File(_) => None,
        }
    }
}

impl fmt::Display for NestedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            RefSource::File(path) => write!(f, "sqlmfile(\"{path}\")"),
            RefSource::Name(name) => write!(f, "sqlmref(\"{name}\")"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_from_str() {
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Dev));
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Prod));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn nested_ref_accessors() {
        let file = NestedRef::file("x", "child.sql");
        assert_eq!(file.file_ref(), Some("child.sql"));
        assert_eq!(file.name_ref(), None);
        assert_eq!(file.to_string(), "sqlmfile(\"child.sql\")");

        let name = NestedRef::name("y", "proj-child");
        assert_eq!(name.name_ref(), Some("proj-child"));
        assert_eq!(name.file_ref(), None);
    }

    #[test]
    fn env_selects_block() {
        let mut d = Directives::default();
        d.env_mut(Environment::Int)
            .keywords
            .insert("k".to_string(), "v".to_string());
        assert_eq!(d.int.keywords["k"], "v");
        assert!(d.env(Environment::Dev).is_empty());
    }
}
