//! Batch free-text recording search against ListenBrainz Labs.
//!
//! Reads `[{artist, track, release, original_artist}, ...]` from stdin and
//! prints each entry with a `results` array appended.  When nothing is found
//! and `original_artist` is in a non-Latin script, the search is retried with
//! the original name.

use std::io::Read;
use std::process;

use clap::Parser;

use lbmapper::config::{self, Config};
use lbmapper::logging::init_logging;
use lbmapper::{search_batch_item, BatchItem, LabsClient};

#[derive(Parser, Debug)]
#[command(name = "search_batch", about = "Search LB Labs for each JSON item on stdin")]
struct Args {
    /// Override the Labs API base URL
    #[arg(long)]
    labs_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

fn read_items() -> Result<Vec<BatchItem>, Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}

fn main() {
    let args = Args::parse();
    config::load_dotenv();
    let config = Config::layered(&Config {
        labs_url: args.labs_url.clone(),
        log_level: args.verbose.then(|| "debug".to_string()),
        ..Config::new()
    });
    init_logging(config.log_level());

    let items = match read_items() {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Invalid input on stdin: {}", e);
            process::exit(1);
        }
    };

    let mut labs = LabsClient::from_config(&config);
    let total = items.len();
    let mut output = Vec::with_capacity(total);
    for (i, item) in items.into_iter().enumerate() {
        let label = format!("{} - {}", item.artist(), item.track());
        let entry = search_batch_item(&mut labs, item);
        eprintln!("[{}/{}] {} -> {} results", i + 1, total, label, entry.results.len());
        output.push(entry);
    }

    match serde_json::to_string(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding output: {}", e);
            process::exit(1);
        }
    }
}
