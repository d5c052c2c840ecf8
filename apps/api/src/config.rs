use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound for loading one export asset (the photo).
    pub asset_timeout_secs: u64,
    pub max_photo_bytes: usize,
    pub max_sessions: usize,
    /// A session untouched for this long is dropped.
    pub session_idle_secs: u64,
    /// Device scale of the export surface.
    pub export_scale: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            asset_timeout_secs: parse_env("ASSET_TIMEOUT_SECS", 10)?,
            max_photo_bytes: parse_env("MAX_PHOTO_BYTES", 5 * 1024 * 1024)?,
            max_sessions: parse_env("MAX_SESSIONS", 1000)?,
            session_idle_secs: parse_session_idle()?,
            export_scale: parse_export_scale()?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

/// The idle sweep runs every quarter of this, so it must be at least 4s.
fn parse_session_idle() -> Result<u64> {
    let secs: u64 = parse_env("SESSION_IDLE_SECS", 2 * 60 * 60)?;
    anyhow::ensure!(secs >= 4, "SESSION_IDLE_SECS must be at least 4, got {secs}");
    Ok(secs)
}

fn parse_export_scale() -> Result<f32> {
    let scale: f32 = parse_env("EXPORT_SCALE", 2.0)?;
    anyhow::ensure!(
        scale.is_finite() && (0.5..=4.0).contains(&scale),
        "EXPORT_SCALE must be between 0.5 and 4, got {scale}"
    );
    Ok(scale)
}
