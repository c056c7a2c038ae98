use likeness_core::ServiceKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("LIKENESS_SERVICE: {0}")]
    Service(String),
}

/// Daemon configuration.
///
/// Defaults, then the TOML file named by `LIKENESS_CONFIG` (if any), then
/// `LIKENESS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which embedding service to run (`face` or `general`).
    pub service: ServiceKind,
    /// Listen address (default: 0.0.0.0:5000).
    pub bind: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
    /// Capacity of the engine request queue.
    pub queue_depth: usize,
    /// Maximum request body size in MiB.
    pub max_upload_mb: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceKind::Face,
            bind: "0.0.0.0:5000".to_string(),
            model_dir: likeness_core::default_model_dir(),
            intra_threads: 2,
            queue_depth: 16,
            max_upload_mb: 16,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit variable lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("LIKENESS_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&src).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LIKENESS_SERVICE") {
            self.service = v.parse().map_err(ConfigError::Service)?;
        }
        if let Some(v) = lookup("LIKENESS_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("LIKENESS_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        env_parse(&lookup, "LIKENESS_INTRA_THREADS", &mut self.intra_threads);
        env_parse(&lookup, "LIKENESS_QUEUE_DEPTH", &mut self.queue_depth);
        env_parse(&lookup, "LIKENESS_MAX_UPLOAD_MB", &mut self.max_upload_mb);
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Overwrite `slot` with the parsed variable; unparsable values are logged
/// and ignored.
fn env_parse<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(v) => *slot = v,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable setting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = Config::load_with(env(&[("LIKENESS_MODEL_DIR", "/models")])).unwrap();
        assert_eq!(c.service, ServiceKind::Face);
        assert_eq!(c.bind, "0.0.0.0:5000");
        assert_eq!(c.model_dir, PathBuf::from("/models"));
        assert_eq!(c.max_upload_bytes(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_env_overrides() {
        let c = Config::load_with(env(&[
            ("LIKENESS_SERVICE", "general"),
            ("LIKENESS_BIND", "127.0.0.1:8080"),
            ("LIKENESS_INTRA_THREADS", "4"),
            ("LIKENESS_QUEUE_DEPTH", "nope"),
        ]))
        .unwrap();
        assert_eq!(c.service, ServiceKind::General);
        assert_eq!(c.bind, "127.0.0.1:8080");
        assert_eq!(c.intra_threads, 4);
        assert_eq!(c.queue_depth, 16);
    }

    #[test]
    fn test_bad_service_is_error() {
        let err = Config::load_with(env(&[("LIKENESS_SERVICE", "audio")])).unwrap_err();
        assert!(matches!(err, ConfigError::Service(_)));
    }

    #[test]
    fn test_file_then_env() {
        let path = std::env::temp_dir().join(format!("likeness-config-{}.toml", std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "service = \"general\"\nbind = \"0.0.0.0:9000\"\nmax_upload_mb = 2").unwrap();
        drop(f);

        let path_str = path.display().to_string();
        let c = Config::load_with(env(&[
            ("LIKENESS_CONFIG", path_str.as_str()),
            ("LIKENESS_BIND", "0.0.0.0:9001"),
        ]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(c.service, ServiceKind::General);
        assert_eq!(c.bind, "0.0.0.0:9001");
        assert_eq!(c.max_upload_mb, 2);
        assert_eq!(c.intra_threads, 2);
    }

    #[test]
    fn test_file_accepts_image_alias() {
        let path = std::env::temp_dir().join(format!("likeness-alias-{}.toml", std::process::id()));
        std::fs::write(&path, "service = \"image\"\n").unwrap();
        let c = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(c.service, ServiceKind::General);
    }

    #[test]
    fn test_unknown_file_key_is_error() {
        let path = std::env::temp_dir().join(format!("likeness-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "threshold = 0.9\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
