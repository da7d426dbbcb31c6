use std::env;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Offset that defines "today" for sessions and streaks.
    pub utc_offset: FixedOffset,

    /// First admin, created at startup when no admin exists yet
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

impl AdminSeed {
    /// Both values or neither. Blank values count as unset.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Result<Option<Self>> {
        let username = username.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let password = password.filter(|p| !p.is_empty());

        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self { username, password })),
            (None, None) => Ok(None),
            _ => Err(anyhow!("ADMIN_USERNAME and ADMIN_PASSWORD must be set together")),
        }
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} is not valid: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let offset_minutes: i32 = parsed_or("UTC_OFFSET_MINUTES", 0)?;
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            utc_offset,
            admin_seed: AdminSeed::from_parts(env::var("ADMIN_USERNAME").ok(), env::var("ADMIN_PASSWORD").ok())?,
        })
    }
}
