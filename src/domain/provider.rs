use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ServiceType;

/// Operator-side business record. `contact_email` is where booking and
/// payment notifications land; it can differ from the profile login email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub display_name: String,
    pub contact_email: String,
    pub service_type: ServiceType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub profile_id: Uuid,
    pub display_name: String,
    pub contact_email: String,
    pub service_type: ServiceType,
}
