use anyhow::Context;

/// Process-wide settings, read once at startup and never re-read.
/// Holds the signing secret, so it has no `Debug` impl.
pub struct Config {
    pub secret: String,
    pub bind: String,
    pub cost: Option<u32>,
    pub origins: Vec<String>,
    pub admin: Option<(String, String)>,
    pub database: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());
        let secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind = match var("BIND_ADDR") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", var("PORT").unwrap_or_else(|| "8080".to_string())),
        };
        let cost = var("HASH_COST")
            .map(|c| c.trim().parse::<u32>())
            .transpose()
            .context("HASH_COST must be a positive integer")?;
        let origins = var("ALLOWED_ORIGINS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => anyhow::bail!("ADMIN_USERNAME and ADMIN_PASSWORD must be set together"),
        };
        Ok(Self {
            secret,
            bind,
            cost,
            origins,
            admin,
            database: var("DB_URL"),
        })
    }
}
