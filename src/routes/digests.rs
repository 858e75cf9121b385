use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use chrono::Utc;
use secrecy::ExposeSecret;

use crate::scheduler::{DigestScheduler, SchedulerError, TriggerSource};
use crate::startup::TriggerSecret;

#[tracing::instrument(name = "Manually triggering a digest cycle", skip(request, scheduler, secret))]
pub async fn handle_trigger_digest(
    request: HttpRequest,
    scheduler: web::Data<DigestScheduler>,
    secret: web::Data<TriggerSecret>,
) -> Result<HttpResponse, TriggerDigestError> {
    let provided = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(TriggerDigestError::Unauthorized)?;

    if provided != secret.0.expose_secret() {
        return Err(TriggerDigestError::Unauthorized);
    }

    let report = scheduler
        .run_cycle(Utc::now(), TriggerSource::Manual)
        .await
        .map_err(TriggerDigestError::SchedulerError)?;

    Ok(HttpResponse::Ok().json(report))
}

#[derive(thiserror::Error, Debug)]
pub enum TriggerDigestError {
    #[error("A valid trigger secret is required.")]
    Unauthorized,
    #[error(transparent)]
    SchedulerError(SchedulerError),
}

impl ResponseError for TriggerDigestError {
    fn status_code(&self) -> StatusCode {
        match self {
            TriggerDigestError::Unauthorized => StatusCode::UNAUTHORIZED,
            TriggerDigestError::SchedulerError(SchedulerError::CycleInProgress) => {
                StatusCode::CONFLICT
            }
            TriggerDigestError::SchedulerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
