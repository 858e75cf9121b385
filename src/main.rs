use good_news_digest::config::get_configuration;
use good_news_digest::startup::Application;
use good_news_digest::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(String::from("good_news_digest"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let address = config.get_address();
    let application = Application::build(config).await?;

    tracing::info!("Server listening on {}", address);

    application.run_until_stop().await
}
