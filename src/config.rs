//! Loads runtime configuration for the AgroNIS ask service by reading environment
//! variables (a `.env` file is honoured), applying defaults, and exposing the
//! values through the strongly typed `Config` struct.
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::{net::SocketAddr, time::Duration};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone, Debug)]
pub struct Config {
    /// Missing is not fatal at startup; each request fails closed instead.
    pub gemini_api_key: Option<String>,
    pub gen_model: String,
    /// Model for the agronomist chat and the local resources search.
    pub chat_model: String,
    pub gemini_base_url: String,
    pub upstream_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let gemini_api_key = var("VITE_GEMINI_API_KEY").or_else(|| var("GEMINI_API_KEY"));
        let gen_model = var("GEN_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());
        let chat_model = var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into());
        let gemini_base_url = var("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs: u64 = var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .parse()
            .context("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;
        let bind_addr: SocketAddr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".into())
            .parse()
            .context("BIND_ADDR must look like 0.0.0.0:8080")?;

        Ok(Config {
            gemini_api_key,
            gen_model,
            chat_model,
            gemini_base_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.gemini_api_key, None);
        assert_eq!(cfg.gen_model, DEFAULT_MODEL);
        assert_eq!(cfg.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(cfg.gemini_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
        assert_eq!(cfg.bind_addr.port(), 8080);
    }

    #[test]
    fn test_key_precedence_and_empty_values() {
        let cfg = load(&[("VITE_GEMINI_API_KEY", "a"), ("GEMINI_API_KEY", "b")]).unwrap();
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("a"));

        let cfg = load(&[("VITE_GEMINI_API_KEY", "  "), ("GEMINI_API_KEY", "b")]).unwrap();
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("b"));

        let cfg = load(&[("VITE_GEMINI_API_KEY", "")]).unwrap();
        assert_eq!(cfg.gemini_api_key, None);
    }

    #[test]
    fn test_overrides() {
        let cfg = load(&[
            ("GEN_MODEL", "gemini-2.5-flash"),
            ("CHAT_MODEL", "gemini-2.5-pro"),
            ("GEMINI_BASE_URL", "http://127.0.0.1:9000/v1beta/"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
            ("BIND_ADDR", "127.0.0.1:3000"),
        ])
        .unwrap();
        assert_eq!(cfg.gen_model, "gemini-2.5-flash");
        assert_eq!(cfg.chat_model, "gemini-2.5-pro");
        assert_eq!(cfg.gemini_base_url, "http://127.0.0.1:9000/v1beta");
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(5));
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(load(&[("UPSTREAM_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
