use clap::Parser;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use quota_server::logging;
use quota_server::reader::{ReadEvent, SustainableReader};

// CLI argument structure
#[derive(Parser, Debug)]
#[command(name = "quota-reader")]
#[command(about = "Read every /dataN endpoint, backing off whenever the server denies")]
struct Args {
    // Server to read from
    #[arg(short, long, default_value = "http://localhost:3100")]
    base_url: String,

    // Number of /dataN paths to read
    #[arg(short = 'n', long, default_value_t = 99)]
    count: u32,

    // Seconds to pause after a failure without Retry-After
    #[arg(long, default_value_t = 10)]
    pause: u64,

    // Max reads in flight, 0 for no cap
    #[arg(short, long, default_value_t = 0)]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = Args::parse();

    let (events_tx, mut events_rx) = mpsc::channel(64);
    let reader = SustainableReader::new(Duration::from_secs(args.pause), events_tx);
    reader.set_limit(args.limit);

    let base = args.base_url.trim_end_matches('/');
    for i in 1..=args.count {
        reader.add(format!("{}/data{}", base, i));
    }
    info!(count = args.count, base_url = %base, "Queued reads");

    // every URL ends in either Data or SysError
    let mut done = 0;
    while done < args.count {
        let Some(event) = events_rx.recv().await else {
            break;
        };

        match event {
            ReadEvent::Data { url, body } => {
                done += 1;
                info!(url = %url, body = %String::from_utf8_lossy(&body), done, "Read");
            }
            ReadEvent::Pause { retry_after } => {
                info!(retry_after = ?retry_after, "pause...");
            }
            ReadEvent::Error { url, error } => {
                warn!(url = %url, error = %error, "Read failed, will retry");
            }
            ReadEvent::SysError { url, error } => {
                done += 1;
                error!(url = %url, error = %error, "Read abandoned");
            }
        }
    }

    reader.stop();
    info!("All reads finished");
    Ok(())
}
