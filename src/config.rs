use std::env;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,

    /// Bearer token lifetime in seconds.
    pub token_ttl: usize,

    /// Fixed offset from UTC, in minutes, applied to every "today"/"now"
    /// derivation. One zone per deployment keeps the holiday comparison and
    /// the is-today comparison from disagreeing around midnight.
    pub tz_offset_minutes: i64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_onboarding_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            token_ttl: env::var("TOKEN_TTL")
                .unwrap_or_else(|_| "86400".to_string()) // default 24 h
                .parse()
                .expect("TOKEN_TTL must be a number"),
            tz_offset_minutes: env::var("TZ_OFFSET_MINUTES")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .expect("TZ_OFFSET_MINUTES must be a number"),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("RATE_LOGIN_PER_MIN must be a number"),
            rate_onboarding_per_min: env::var("RATE_ONBOARDING_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("RATE_ONBOARDING_PER_MIN must be a number"),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .expect("RATE_PROTECTED_PER_MIN must be a number"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        }
    }

    /// Wall clock in the configured zone.
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(self.tz_offset_minutes)
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date()
    }
}
