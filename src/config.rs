use anyhow::{bail, Context};

pub const DEFAULT_HASH_COST: u32 = 10;
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;
/// Ten years.
pub const MAX_TOKEN_EXPIRY_HOURS: i64 = 87_600;

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub private_key_location: String,
    pub public_key_location: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub token: TokenConfig,
    pub hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let expiry_hours = parse_expiry_hours(std::env::var("TOKEN_EXPIRY_HOURS").ok().as_deref())
            .context("invalid TOKEN_EXPIRY_HOURS")?;
        let token = TokenConfig {
            private_key_location: std::env::var("PRIVATE_KEY_LOCATION")
                .unwrap_or_else(|_| "./config/private_key.pem".into()),
            public_key_location: std::env::var("PUBLIC_KEY_LOCATION")
                .unwrap_or_else(|_| "./config/public_key.pem".into()),
            expiry_hours,
        };
        let hash_cost = parse_hash_cost(std::env::var("HASH_COST").ok().as_deref());
        Ok(Self {
            database_url,
            database_max_connections,
            token,
            hash_cost,
        })
    }
}

/// Unset, unparsable or out-of-range values fall back to the default cost.
pub fn parse_hash_cost(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|c| (MIN_HASH_COST..=MAX_HASH_COST).contains(c))
        .unwrap_or(DEFAULT_HASH_COST)
}

/// Unset means the default; anything else must be a whole number of hours
/// in `1..=MAX_TOKEN_EXPIRY_HOURS`.
pub fn parse_expiry_hours(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_EXPIRY_HOURS);
    };
    let hours = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("{raw:?} is not a number of hours"))?;
    if !(1..=MAX_TOKEN_EXPIRY_HOURS).contains(&hours) {
        bail!("{hours} is outside 1..={MAX_TOKEN_EXPIRY_HOURS} hours");
    }
    Ok(hours)
}
