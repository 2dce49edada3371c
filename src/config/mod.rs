//! Settings read from the environment (and `.env`, loaded by `main`).

use crate::error::ConfigError;
use crate::models::Catalog;
use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

lazy_static! {
    static ref ADMIN_PATH: Regex = Regex::new(r"^(/[A-Za-z0-9_-]+)+$").unwrap();
}

const DEFAULT_DATABASE_URL: &str = "sqlite:data/app.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ADDRESS: [u8; 4] = [0, 0, 0, 0];
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ADMIN_PATH: &str = "/admin-7f3c2d";
const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub address: IpAddr,
    pub port: u16,
    pub admin_path: String,
    pub static_dir: PathBuf,
    pub questions_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            address: IpAddr::from(DEFAULT_ADDRESS),
            port: DEFAULT_PORT,
            admin_path: DEFAULT_ADMIN_PATH.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            questions_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source; unset or blank variables take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let settings = Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                var("DATABASE_MAX_CONNECTIONS"),
                "a positive integer",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            address: parse_var(
                "ADDRESS",
                var("ADDRESS"),
                "an IP address",
                IpAddr::from(DEFAULT_ADDRESS),
            )?,
            port: parse_var("PORT", var("PORT"), "a port number", DEFAULT_PORT)?,
            admin_path: var("ADMIN_PATH").unwrap_or_else(|| DEFAULT_ADMIN_PATH.to_string()),
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            questions_path: var("QUESTIONS_PATH").map(PathBuf::from),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidVar {
                name: "DATABASE_MAX_CONNECTIONS",
                expected: "a positive integer",
                value: self.max_connections.to_string(),
            });
        }
        if !ADMIN_PATH.is_match(&self.admin_path) {
            return Err(ConfigError::InvalidVar {
                name: "ADMIN_PATH",
                expected: "a path like /admin-7f3c2d",
                value: self.admin_path.clone(),
            });
        }
        Ok(())
    }

    /// The configured question catalog, or the built-in one.
    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.questions_path {
            Some(path) => Catalog::from_file(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidVar {
                name,
                expected,
                value,
            }),
    }
}
