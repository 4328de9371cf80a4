//! Environment bindings handed to a worker on every invocation
//!
//! The host builds one [`Env`] at startup and passes it by reference into each
//! event. Workers never read process environment variables directly.

use std::collections::HashMap;
use std::fmt;

/// A single host-injected secret. Redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Binding(String);

impl Binding {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Binding").field(&"<redacted>").finish()
    }
}

/// Immutable set of bindings available to a worker
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Env {
    bindings: HashMap<String, Binding>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret (builder pattern). A later value for the same name wins.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.insert(name.into(), Binding(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Value of a secret
    pub fn secret(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(Binding::value)
    }

    /// Binding names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let env = Env::new()
            .with_secret("MY_SECRET", "abcdef123")
            .with_secret("API_TOKEN", "t0k3n");

        assert_eq!(env.secret("MY_SECRET"), Some("abcdef123"));
        assert_eq!(env.get("API_TOKEN").map(Binding::value), Some("t0k3n"));
        assert!(env.get("MISSING").is_none());
        assert_eq!(env.names(), vec!["API_TOKEN", "MY_SECRET"]);
        assert!(!env.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let env = Env::new().with_secret("MY_SECRET", "abcdef123");
        let printed = format!("{:?}", env);
        assert!(printed.contains("MY_SECRET"));
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("abcdef123"));
    }

    #[test]
    fn test_later_binding_wins() {
        let env = Env::new()
            .with_secret("MY_SECRET", "from-file")
            .with_secret("MY_SECRET", "from-process");
        assert_eq!(env.len(), 1);
        assert_eq!(env.secret("MY_SECRET"), Some("from-process"));
    }
}
