use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub static_dir: PathBuf,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match var(key) {
                Some(v) if !v.is_empty() => Ok(v),
                _ => bail!("{key} must be set"),
            }
        };

        let jwt_secret = required("CHIRPY_JWT_SECRET")?;
        let polka_key = required("CHIRPY_POLKA_KEY")?;

        let db_path = var("CHIRPY_DB_PATH").unwrap_or_else(|| "database.json".into());
        let static_dir = var("CHIRPY_STATIC_DIR").unwrap_or_else(|| ".".into());
        let host = var("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CHIRPY_PORT")
            .unwrap_or_else(|| "8080".into())
            .parse()
            .context("CHIRPY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("CHIRPY_HOST must be an IP address")?;

        Ok(Self {
            jwt_secret,
            polka_key,
            db_path: db_path.into(),
            static_dir: static_dir.into(),
            addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = Config::from_lookup(lookup(&[
            ("CHIRPY_JWT_SECRET", "jwt"),
            ("CHIRPY_POLKA_KEY", "polka"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("database.json"));
        assert_eq!(config.static_dir, PathBuf::from("."));
        assert_eq!(config.addr.port(), 8080);
    }

    #[test]
    fn missing_or_empty_secrets_are_fatal() {
        assert!(Config::from_lookup(lookup(&[("CHIRPY_POLKA_KEY", "polka")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CHIRPY_JWT_SECRET", "jwt")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[
                ("CHIRPY_JWT_SECRET", ""),
                ("CHIRPY_POLKA_KEY", "polka"),
            ]))
            .is_err()
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("CHIRPY_JWT_SECRET", "jwt"),
            ("CHIRPY_POLKA_KEY", "polka"),
            ("CHIRPY_PORT", "http"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CHIRPY_PORT"));
    }
}
