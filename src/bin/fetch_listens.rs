//! Scan listen history backwards and print the unlinked listens as JSON.
//!
//! Usage:
//!     fetch_listens [COUNT] [--user NAME]
//!
//! Output (stdout):
//!     {"total": N, "linked": N, "unlinked": [{listened_at, recording_msid, artist, track, release}, ...]}

use std::process;

use clap::Parser;
use serde::Serialize;

use lbmapper::config::{self, Config};
use lbmapper::logging::init_logging;
use lbmapper::{Listen, ListenBrainzClient, ListenService};

#[derive(Parser, Debug)]
#[command(name = "fetch_listens", about = "Print unlinked listens as JSON")]
struct Args {
    /// Stop after this many unlinked listens
    #[arg(default_value_t = 1000)]
    count: usize,

    /// ListenBrainz user name (default: LB_USER or saved default)
    #[arg(long)]
    user: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct UnlinkedListen<'a> {
    listened_at: i64,
    recording_msid: &'a str,
    artist: &'a str,
    track: &'a str,
    release: &'a str,
}

impl<'a> From<&'a Listen> for UnlinkedListen<'a> {
    fn from(l: &'a Listen) -> Self {
        UnlinkedListen {
            listened_at: l.listened_at,
            recording_msid: &l.recording_msid,
            artist: &l.artist_name,
            track: &l.track_name,
            release: &l.release_name,
        }
    }
}

#[derive(Serialize)]
struct Output<'a> {
    total: usize,
    linked: usize,
    unlinked: Vec<UnlinkedListen<'a>>,
}

fn main() {
    let args = Args::parse();
    config::load_dotenv();
    let config = Config::layered(&Config {
        user: args.user.clone(),
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
    let user = match config.user.clone().or_else(config::listenbrainz_user) {
        Some(u) => u,
        None => {
            eprintln!("LB_USER not set");
            process::exit(1);
        }
    };

    let mut client = ListenBrainzClient::from_config(&config, &token);
    let scan = match client.fetch_unlinked_listens(&user, args.count) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error fetching listens: {}", e);
            process::exit(1);
        }
    };

    let output = Output {
        total: scan.total,
        linked: scan.linked,
        unlinked: scan.unlinked.iter().map(UnlinkedListen::from).collect(),
    };
    match serde_json::to_string(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding output: {}", e);
            process::exit(1);
        }
    }

    eprintln!(
        "Scanned {}, {} linked, {} unlinked",
        scan.total,
        scan.linked,
        scan.unlinked.len()
    );
}
