//! Apply reviewed mappings and deletions read from stdin.
//!
//! Input:
//!     {"mappings": [{"recording_msid": "...", "recording_mbid": "..."}, ...],
//!      "deletions": [{"listened_at": 123, "recording_msid": "..."}, ...]}

use std::io::Read;
use std::process;

use clap::Parser;

use lbmapper::config::{self, Config};
use lbmapper::logging::init_logging;
use lbmapper::plan::{apply_plan, Plan};
use lbmapper::ListenBrainzClient;

#[derive(Parser, Debug)]
#[command(name = "execute", about = "Submit mappings and delete listens from a JSON plan on stdin")]
struct Args {
    #[arg(short, long)]
    verbose: bool,
}

fn read_plan() -> Result<Plan, Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok(serde_json::from_str(&input)?)
}

fn main() {
    let args = Args::parse();
    config::load_dotenv();
    let config = Config::layered(&Config {
        log_level: args.verbose.then(|| "debug".to_string()),
        ..Config::new()
    });
    init_logging(config.log_level());

    let token = match config::listenbrainz_token() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let plan = match read_plan() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Invalid plan on stdin: {}", e);
            process::exit(1);
        }
    };

    let mut client = ListenBrainzClient::from_config(&config, &token);
    let report = apply_plan(&mut client, &plan);
    eprintln!("{}", report);
}
