use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// User model matching the database schema
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    /// Issuer of the user's auth token
    pub issuer: String,
    pub email: Option<String>,
    pub eth_address: Option<String>,
    pub referral_id: String,
    pub referred_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
