//! Builds the worker's [`Env`] from a local vars file and the process environment
//!
//! The vars file uses the `.dev.vars` layout:
//!
//! ```text
//! # comment
//! MY_SECRET=abcdef123
//! export OTHER="quoted value"
//! ```
//!
//! Every entry becomes a secret binding. Names listed in
//! `EDGE_WORKER_SECRETS` are then read from the process environment and
//! override file entries of the same name.

use std::io::ErrorKind;
use std::path::Path;

use edge_worker_sdk::Env;

use crate::config::{ConfigError, HostConfig};

/// Load bindings for `config`, reading process variables through `lookup`
pub fn load(config: &HostConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Env, ConfigError> {
    let mut env = Env::new();

    for (name, value) in read_vars_file(&config.vars_file)? {
        env = env.with_secret(name, value);
    }

    for name in &config.secret_names {
        if let Some(value) = lookup(name) {
            env = env.with_secret(name.clone(), value);
        }
    }

    tracing::info!(bindings = ?env.names(), "Worker bindings loaded");
    Ok(env)
}

/// Read `path` as a vars file. A missing file yields no entries.
pub fn read_vars_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!("Reading vars file {:?}", path);
            Ok(parse_vars(&contents))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(ConfigError::VarsFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks, comments and malformed lines
pub fn parse_vars(contents: &str) -> Vec<(String, String)> {
    let mut vars = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            tracing::warn!(line = idx + 1, "Ignoring vars line without '='");
            continue;
        };

        let key = key.trim();
        if key.is_empty() {
            tracing::warn!(line = idx + 1, "Ignoring vars line with empty name");
            continue;
        }

        vars.push((key.to_string(), unquote(value.trim()).to_string()));
    }

    vars
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_vars() {
        let vars = parse_vars(
            "# local secrets\n\
             MY_SECRET=abcdef123\n\
             \n\
             export QUOTED=\"hello world\"\n\
             SINGLE='x=y'\n\
             broken line\n\
             =nokey\n\
             EMPTY=\n",
        );

        assert_eq!(
            vars,
            vec![
                ("MY_SECRET".to_string(), "abcdef123".to_string()),
                ("QUOTED".to_string(), "hello world".to_string()),
                ("SINGLE".to_string(), "x=y".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let vars = read_vars_file(&dir.path().join("absent.vars")).unwrap();
        assert!(vars.is_empty());
    }

    #[test]
    fn test_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_vars_file(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::VarsFile { .. }));
    }

    #[test]
    fn test_process_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MY_SECRET=from-file").unwrap();
        writeln!(file, "FILE_ONLY=kept").unwrap();

        let config = HostConfig {
            vars_file: file.path().to_path_buf(),
            secret_names: vec!["MY_SECRET".to_string(), "UNSET".to_string()],
            ..HostConfig::default()
        };

        let env = load(&config, |name| {
            (name == "MY_SECRET").then(|| "from-process".to_string())
        })
        .unwrap();

        assert_eq!(env.secret("MY_SECRET"), Some("from-process"));
        assert_eq!(env.secret("FILE_ONLY"), Some("kept"));
        assert!(env.get("UNSET").is_none());
        assert_eq!(env.len(), 2);
    }
}
