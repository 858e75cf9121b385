use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};

use crate::{
    domain::new_subscriber::{NewSubscriber, NewSubscriberBody},
    subscriber_store::{SubscriberStore, UpsertOutcome},
};

#[derive(serde::Serialize)]
struct SubscriptionResponse {
    message: String,
}

#[tracing::instrument(
    name = "Creating or updating a subscriber handler",
    skip(body, store),
    fields(
        subscriber_email = %body.email,
        interests = ?body.interests
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<NewSubscriberBody>,
    store: web::Data<dyn SubscriberStore>,
) -> Result<HttpResponse, SubscribeError> {
    let new_subscriber = NewSubscriber::try_from(body).map_err(SubscribeError::ValidationError)?;

    let outcome = store
        .upsert(&new_subscriber)
        .await
        .map_err(SubscribeError::StoreError)?;

    let response = match outcome {
        UpsertOutcome::Created => HttpResponse::Created().json(SubscriptionResponse {
            message: format!(
                "Subscribed! Your first good news digest arrives at 7:30 AM ({}).",
                new_subscriber.timezone.as_ref()
            ),
        }),
        UpsertOutcome::Updated => HttpResponse::Ok().json(SubscriptionResponse {
            message: String::from("Your preferences have been updated."),
        }),
    };

    Ok(response)
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to save the subscription.")]
    StoreError(#[source] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscribeError::StoreError(err) => write!(f, "{}\nCaused by:\n\t{:?}", self, err),
            _ => write!(f, "{}", self),
        }
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
