use chat_relay::{config::AppConfig, logger, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_tracing();

    let config = AppConfig::from_env();
    server::serve(config).await
}
