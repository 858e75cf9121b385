use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::curation::CurationRules;
use crate::email_client::EmailClient;
use crate::news_client::NewsApiClient;
use crate::routes::{handle_create_subscription, handle_trigger_digest, health_check};
use crate::scheduler::{spawn_digest_timer, DigestOptions, DigestScheduler};
use crate::subscriber_store::{PgSubscriberStore, SubscriberStore};

/// Shared secret the manual trigger endpoint checks against.
pub struct TriggerSecret(pub Secret<String>);

pub struct Application {
    pub port: u16,
    pub server: Server,
    pub timer: Option<JoinHandle<()>>,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let store: Arc<dyn SubscriberStore> = Arc::new(PgSubscriberStore::new(db_pool));
        let scheduler = Arc::new(build_scheduler(&config, store.clone()));

        let timer = if config.digest.timer_enabled {
            tracing::info!(
                "Digest timer enabled, running every {} minutes",
                config.digest.cadence_minutes
            );
            Some(spawn_digest_timer(
                scheduler.clone(),
                config.digest.get_cadence(),
            ))
        } else {
            None
        };

        let listener =
            TcpListener::bind(config.get_address()).expect("Failed to bind the address.");
        let port = listener.local_addr()?.port();
        let trigger_secret = TriggerSecret(config.digest.trigger_secret.clone());
        let server = run(listener, store, scheduler, trigger_secret)?;

        Ok(Self {
            port,
            server,
            timer,
        })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        let result = self.server.await;

        if let Some(timer) = self.timer {
            timer.abort();
        }

        result
    }
}

/// Wires the production collaborators into a scheduler. Shared by the HTTP
/// application and the one-shot digest job.
pub fn build_scheduler(config: &Settings, store: Arc<dyn SubscriberStore>) -> DigestScheduler {
    let sender_email = config
        .get_email_client_sender()
        .expect("Sender email is not valid");
    let email_client = EmailClient::new(
        config.email_client.base_url.clone(),
        sender_email,
        config.email_client.api_key.clone(),
        Some(config.email_client.get_timeout()),
    );
    let news_client = NewsApiClient::new(
        config.news_api.base_url.clone(),
        config.news_api.api_key.clone(),
        Some(config.news_api.get_timeout()),
    );

    DigestScheduler::new(
        store,
        Arc::new(news_client),
        Arc::new(email_client),
        CurationRules::from(&config.curation),
        DigestOptions::from(config),
    )
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn SubscriberStore>,
    scheduler: Arc<DigestScheduler>,
    trigger_secret: TriggerSecret,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn SubscriberStore> = web::Data::from(store);
    let scheduler = web::Data::from(scheduler);
    let trigger_secret = web::Data::new(trigger_secret);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(handle_create_subscription))
            .route("/digests/trigger", web::post().to(handle_trigger_digest))
            .app_data(store.clone())
            .app_data(scheduler.clone())
            .app_data(trigger_secret.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
