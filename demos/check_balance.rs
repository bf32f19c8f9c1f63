use std::io;

use smmpanel::{ApiKey, ProviderUrl, SmmClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("SMM_API_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMM_API_URL environment variable is required",
        )
    })?;
    let key = std::env::var("SMM_API_KEY").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "SMM_API_KEY environment variable is required",
        )
    })?;

    let client = SmmClient::new(ProviderUrl::parse(url)?, ApiKey::new(key)?)?;
    let balance = client.balance().await.into_result()?;

    println!(
        "balance: {}, currency: {}",
        balance["balance"], balance["currency"]
    );

    Ok(())
}
