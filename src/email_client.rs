use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::subscriber_email::SubscriberEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Outbound email capability used by the digest scheduler.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one HTML email and returns the id assigned by the provider.
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> anyhow::Result<String>;
}

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    api_key: Secret<String>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
}

#[derive(serde::Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> EmailClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        }
    }

    pub async fn send(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> Result<String, reqwest::Error> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailBody {
            from: self.sender.as_ref(),
            to: vec![recipient.as_ref()],
            subject,
            html: html_content,
        };

        let response: SendEmailResponse = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()? // return an error when server response status code is 4xx or 5xx
            .json()
            .await?;

        Ok(response.id)
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
    ) -> anyhow::Result<String> {
        Ok(self.send(recipient, subject, html_content).await?)
    }
}
