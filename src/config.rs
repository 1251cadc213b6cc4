use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub static_folder: PathBuf,
    pub secret_key: Vec<u8>,
    pub csrf_enabled: bool,
    pub csrf_time_limit_secs: i64,
    pub title_max_len: usize,
    pub poster_extensions: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://marquee.db?mode=rwc".to_string());

        let upload_folder =
            PathBuf::from(std::env::var("UPLOAD_FOLDER").unwrap_or_else(|_| "uploads".to_string()));
        let static_folder =
            PathBuf::from(std::env::var("STATIC_FOLDER").unwrap_or_else(|_| "static".to_string()));

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) if !key.trim().is_empty() => key.into_bytes(),
            _ => {
                tracing::warn!("SECRET_KEY not set; CSRF tokens will not survive a restart");
                crate::csrf::random_bytes::<32>().to_vec()
            }
        };

        let csrf_enabled = match std::env::var("CSRF_ENABLED") {
            Ok(v) => parse_bool(&v).context("CSRF_ENABLED")?,
            Err(_) => true,
        };

        let csrf_time_limit_secs: i64 = std::env::var("CSRF_TIME_LIMIT")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .context("CSRF_TIME_LIMIT")?;

        let title_max_len: usize = std::env::var("TITLE_MAX_LEN")
            .unwrap_or_else(|_| "80".to_string())
            .parse()
            .context("TITLE_MAX_LEN")?;

        let poster_extensions = parse_extensions(
            &std::env::var("POSTER_EXTENSIONS").unwrap_or_else(|_| "jpg,png".to_string()),
        );
        if poster_extensions.is_empty() {
            anyhow::bail!("POSTER_EXTENSIONS must name at least one extension");
        }

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .context("MAX_UPLOAD_BYTES")?;

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            upload_folder,
            static_folder,
            secret_key,
            csrf_enabled,
            csrf_time_limit_secs,
            title_max_len,
            poster_extensions,
            max_upload_bytes,
        })
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}
