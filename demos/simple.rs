use clap::Parser;
use dweet_http_api_rs::dweet::Dweet;
use dweet_http_api_rs::error::Result;
use serde_json::json;
use std::time::Duration;

/// Simple program to test the dweet HTTP API: publish, read back, listen.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The thing name to publish to and listen on
    #[arg(short, long)]
    thing: String,

    /// Access key, required if the thing is locked
    #[arg(short, long)]
    key: Option<String>,

    /// Seconds to keep the listener open
    #[arg(short, long, default_value_t = 30)]
    seconds: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Dweet::new()?;
    let key = args.key.as_deref();

    // Publish a dweet for the thing.
    let published = client
        .dweet_for(&args.thing, &json!({"hello": "world"}), key)
        .await?;
    println!("Published: {}", published);

    // Read it back.
    let latest = client.get_latest_dweet_for(&args.thing, key).await?;
    if let Some(record) = latest.first() {
        println!("Latest: {}", record);
    }

    // Listen for new dweets until the deadline runs out. Dweet to the thing
    // from elsewhere (e.g. another shell) to see events come through.
    let mut listener = client
        .listen_for_dweets_from(&args.thing, key)
        .with_timeout(Some(Duration::from_secs(args.seconds)));
    println!("Listening for {} seconds...", args.seconds);
    while let Some(event) = listener.next().await {
        match event {
            Ok(dweet) => println!("Heard: {}", dweet),
            Err(err) => eprintln!("Listener failed: {}", err),
        }
    }
    println!("Done listening.");
    Ok(())
}
