use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A stored subscriber. The timezone is kept as the raw stored string so a
/// row with an unsupported zone can still be loaded and skipped.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub interests: Vec<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_digest_on: Option<NaiveDate>,
}
