use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::domain::new_subscriber::NewSubscriber;
use crate::domain::subscriber::Subscriber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Persistence for subscribers, keyed by email (case-sensitive).
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn get_all(&self) -> anyhow::Result<Vec<Subscriber>>;

    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Subscriber>>;

    async fn insert(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()>;

    /// Replaces interests and timezone of an existing subscriber.
    async fn update_preferences(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()>;

    /// Records `date` as the subscriber's last digest date unless a digest
    /// was already claimed for that date or later. Returns whether the
    /// claim succeeded.
    async fn claim_delivery(&self, email: &str, date: NaiveDate) -> anyhow::Result<bool>;

    /// Updates the subscriber in place when the email is already known,
    /// inserts it otherwise.
    async fn upsert(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<UpsertOutcome> {
        match self.get_by_email(new_subscriber.email.as_ref()).await? {
            Some(_) => {
                self.update_preferences(new_subscriber).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.insert(new_subscriber).await?;
                Ok(UpsertOutcome::Created)
            }
        }
    }
}

pub struct PgSubscriberStore {
    db_pool: PgPool,
}

impl PgSubscriberStore {
    pub fn new(db_pool: PgPool) -> PgSubscriberStore {
        PgSubscriberStore { db_pool }
    }
}

fn subscriber_from_row(row: PgRow) -> Subscriber {
    Subscriber {
        id: row.get("id"),
        email: row.get("email"),
        interests: row.get("interests"),
        timezone: row.get("timezone"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        last_digest_on: row.get("last_digest_on"),
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    #[tracing::instrument(name = "Loading all subscribers", skip(self))]
    async fn get_all(&self) -> anyhow::Result<Vec<Subscriber>> {
        let subscribers = sqlx::query(
            r#"
            SELECT id, email, interests, timezone, created_at, updated_at, last_digest_on
            FROM subscriptions
            ORDER BY created_at
            "#,
        )
        .map(subscriber_from_row)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(subscribers)
    }

    #[tracing::instrument(name = "Looking up a subscriber by email", skip(self))]
    async fn get_by_email(&self, email: &str) -> anyhow::Result<Option<Subscriber>> {
        let subscriber = sqlx::query(
            r#"
            SELECT id, email, interests, timezone, created_at, updated_at, last_digest_on
            FROM subscriptions
            WHERE email = $1
            "#,
        )
        .bind(email)
        .map(subscriber_from_row)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(subscriber)
    }

    #[tracing::instrument(
        name = "Insert a new subscriber into the database",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn insert(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()> {
        let now = Utc::now();

        // A concurrent signup for the same email turns into an update.
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, email, interests, timezone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (email) DO UPDATE
            SET interests = EXCLUDED.interests,
                timezone = EXCLUDED.timezone,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_subscriber.email.as_ref())
        .bind(new_subscriber.interests.as_strings())
        .bind(new_subscriber.timezone.as_ref())
        .bind(now)
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

        Ok(())
    }

    #[tracing::instrument(
        name = "Update the preferences of a subscriber",
        skip(self, new_subscriber),
        fields(subscriber_email = %new_subscriber.email)
    )]
    async fn update_preferences(&self, new_subscriber: &NewSubscriber) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET interests = $2, timezone = $3, updated_at = $4
            WHERE email = $1
            "#,
        )
        .bind(new_subscriber.email.as_ref())
        .bind(new_subscriber.interests.as_strings())
        .bind(new_subscriber.timezone.as_ref())
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

        Ok(())
    }

    #[tracing::instrument(name = "Claiming a daily digest delivery", skip(self))]
    async fn claim_delivery(&self, email: &str, date: NaiveDate) -> anyhow::Result<bool> {
        // Check and set in one statement so two concurrent cycles cannot both win.
        let claimed = sqlx::query(
            r#"
            UPDATE subscriptions
            SET last_digest_on = $2
            WHERE email = $1 AND (last_digest_on IS NULL OR last_digest_on < $2)
            RETURNING email
            "#,
        )
        .bind(email)
        .bind(date)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(claimed.is_some())
    }
}
