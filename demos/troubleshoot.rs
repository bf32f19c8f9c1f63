use std::io;

use smmpanel::{ServerSettings, Troubleshooter};

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

    let settings = ServerSettings::default();
    let troubleshooter = Troubleshooter::from_settings(&settings, settings.build_transport()?);
    let result = troubleshooter.troubleshoot(&url, &key).await;

    println!("success: {}, message: {}", result.success, result.message);
    if let Some(fix) = &result.fix {
        println!("fix: {}", fix.description);
    }
    if let Some(details) = &result.details {
        println!("network: {details:?}");
    }
    for suggestion in &result.suggestions {
        println!("- {suggestion}");
    }

    Ok(())
}
