use anyhow::Context;
use serde::Deserialize;

const DEFAULT_EMAIL_DOMAINS: &str =
    "siescoms.sies.edu.in,siesascn.sies.edu.in,ssbs.sies.edu.in,siesgst.sies.edu.in";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub base_url: String,
}

/// S3-compatible bucket holding uploaded food images.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Prefix for stored image URLs; defaults to `{endpoint}/{bucket}`.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    pub storage: StorageConfig,
    /// Institutional domains accepted at signup and signin, without the `@`.
    pub allowed_email_domains: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "canteen".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "canteen-users".into()),
            ttl_minutes: positive_minutes(
                "JWT_TTL_MINUTES",
                std::env::var("JWT_TTL_MINUTES").ok(),
                60 * 24 * 5,
            )?,
            refresh_ttl_minutes: positive_minutes(
                "JWT_REFRESH_TTL_MINUTES",
                std::env::var("JWT_REFRESH_TTL_MINUTES").ok(),
                60 * 24 * 14,
            )?,
        };
        let razorpay = RazorpayConfig {
            key_id: std::env::var("RAZORPAY_KEY_ID").context("RAZORPAY_KEY_ID")?,
            key_secret: std::env::var("RAZORPAY_KEY_SECRET").context("RAZORPAY_KEY_SECRET")?,
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
        };
        let endpoint = std::env::var("STORAGE_ENDPOINT").context("STORAGE_ENDPOINT")?;
        let bucket = std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "canteen".into());
        let storage = StorageConfig {
            public_base_url: std::env::var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket)),
            access_key: std::env::var("STORAGE_ACCESS_KEY").context("STORAGE_ACCESS_KEY")?,
            secret_key: std::env::var("STORAGE_SECRET_KEY").context("STORAGE_SECRET_KEY")?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into()),
            endpoint,
            bucket,
        };
        let allowed_email_domains = parse_domains(
            &std::env::var("ALLOWED_EMAIL_DOMAINS")
                .unwrap_or_else(|_| DEFAULT_EMAIL_DOMAINS.into()),
        );
        Ok(Self {
            database_url,
            jwt,
            razorpay,
            storage,
            allowed_email_domains,
        })
    }
}

/// Unset falls back to `default`; anything that isn't a positive integer is a startup error.
fn positive_minutes(name: &str, raw: Option<String>, default: i64) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => anyhow::bail!("{name} must be a positive number of minutes, got {raw:?}"),
    }
}

fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().trim_start_matches('@').to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}
