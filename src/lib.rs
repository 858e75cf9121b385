pub mod config;
pub mod curation;
pub mod digest;
pub mod domain;
pub mod email_client;
pub mod news_client;
pub mod routes;
pub mod scheduler;
pub mod startup;
pub mod subscriber_store;
pub mod telemetry;

#[cfg(test)]
mod test_doubles;
