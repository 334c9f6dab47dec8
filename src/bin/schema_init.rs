use twinfleet_udq::{config::ReaderConfig, runtime, schema::SchemaInitializer, TimestreamClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::init_logger()?;

    let config = ReaderConfig::from_env();
    let client = TimestreamClient::from_env()?;
    log::info!("schema initializer starting in region {}", client.region());

    runtime::run(SchemaInitializer::new(client, config)).await?;

    Ok(())
}
