use std::{env, path::PathBuf};

use anyhow::Context;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9696;
const DEFAULT_MODEL_PATH: &str = "models/xgboost_model.bin";

/// Where the service listens and which artifact it serves.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_path: DEFAULT_MODEL_PATH.into(),
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT` and `MODEL_PATH`, falling back to the defaults for unset ones.
    ///
    /// # Errors
    /// If `PORT` is set but isn't a valid port number.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(host) = var("HOST") {
            config.host = host;
        }
        if let Some(port) = var("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("invalid PORT {port:?}"))?;
        }
        if let Some(path) = var("MODEL_PATH") {
            config.model_path = path.into();
        }

        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_listen_on_every_interface() {
        let config = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.addr(), "0.0.0.0:9696");
        assert_eq!(config.model_path, PathBuf::from("models/xgboost_model.bin"));
    }

    #[test]
    fn env_overrides_defaults() {
        let config =
            ServerConfig::from_vars(vars(&[("PORT", "8080"), ("MODEL_PATH", "/tmp/m.bin")]))
                .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.model_path, PathBuf::from("/tmp/m.bin"));
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(ServerConfig::from_vars(vars(&[("PORT", "ninety")])).is_err());
    }
}
