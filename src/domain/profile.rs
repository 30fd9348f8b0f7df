use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: ProfileRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub role: ProfileRole,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Consumer,
    Provider,
    Admin,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Consumer => "consumer",
            ProfileRole::Provider => "provider",
            ProfileRole::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consumer" => Some(ProfileRole::Consumer),
            "provider" => Some(ProfileRole::Provider),
            "admin" => Some(ProfileRole::Admin),
            _ => None,
        }
    }
}
