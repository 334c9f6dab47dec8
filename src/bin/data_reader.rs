use twinfleet_udq::{config::ReaderConfig, reader::TimestreamReader, runtime, TimestreamClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::init_logger()?;

    let config = ReaderConfig::from_env();
    let client = TimestreamClient::from_env()?;
    log::info!("data reader starting in region {}", client.region());

    runtime::run(TimestreamReader::new(client, config)).await?;

    Ok(())
}
