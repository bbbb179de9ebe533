use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;
use crate::model::employee::{Employee, Role};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id.
    pub sub: u64,
    pub organization_id: u64,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

pub fn issue_token(employee: &Employee, secret: &str, ttl: usize) -> Result<String, EngineError> {
    let claims = Claims {
        sub: employee.id,
        organization_id: employee.organization_id,
        role: employee.role,
        exp: unix_now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| EngineError::validation("token could not be issued"))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
