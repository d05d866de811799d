//! Map recent unlinked ListenBrainz listens to MusicBrainz recordings.
//!
//! Usage:
//!     lbmap --user NAME [--count 50] [--max-ts TS] [--dry-run] [--verbose]
//!     lbmap --auto-accept-score 85 --save-defaults
//!     lbmap --show-defaults

use std::process;

use clap::Parser;

use lbmapper::config::{self, Config};
use lbmapper::logging::init_logging;
use lbmapper::{
    display_result, CachingTranslator, ListenBrainzClient, ListenService, MatchSelector,
    MatchSettings, MusicBrainzSearch, Pipeline, Summary,
};

#[derive(Parser, Debug)]
#[command(name = "lbmap", version, about = "Link unlinked ListenBrainz listens to MusicBrainz recordings")]
struct Args {
    /// ListenBrainz user name (default: LB_USER or saved default)
    #[arg(long)]
    user: Option<String>,

    /// Number of recent listens to process
    #[arg(long)]
    count: Option<u32>,

    /// Only fetch listens before this Unix timestamp
    #[arg(long)]
    max_ts: Option<i64>,

    /// Show what would be mapped without submitting
    #[arg(long)]
    dry_run: bool,

    /// Minimum search score for automatic acceptance
    #[arg(long)]
    auto_accept_score: Option<u32>,

    /// Minimum milliseconds between MusicBrainz requests
    #[arg(long)]
    min_request_interval_ms: Option<u64>,

    /// Translation program, then its leading arguments, one value per flag
    /// (e.g. --translator-arg llm --translator-arg -m --translator-arg "model name")
    #[arg(long = "translator-arg", value_name = "ARG", allow_hyphen_values = true)]
    translator_command: Vec<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Save the given options as defaults and exit
    #[arg(long)]
    save_defaults: bool,

    /// Show built-in and saved defaults and exit
    #[arg(long)]
    show_defaults: bool,
}

impl Args {
    /// Only the options given explicitly on the command line.
    fn to_config(&self) -> Config {
        Config {
            user: self.user.clone(),
            count: self.count,
            auto_accept_score: self.auto_accept_score,
            min_request_interval_ms: self.min_request_interval_ms,
            translator_command: if self.translator_command.is_empty() {
                None
            } else {
                Some(self.translator_command.clone())
            },
            log_level: if self.verbose { Some("debug".to_string()) } else { None },
            ..Config::new()
        }
    }
}

fn show_defaults() {
    Config::builtin_defaults().print("Built-in defaults");
    println!();
    match Config::get_config_path() {
        Ok(path) if path.exists() => match Config::load() {
            Ok(saved) => saved.print(&format!("Saved defaults from {:?}", path)),
            Err(e) => eprintln!("Could not read {:?}: {}", path, e),
        },
        Ok(path) => {
            println!("No saved defaults file found at {:?}", path);
            println!("Use --save-defaults to create one.");
        }
        Err(e) => eprintln!("{}", e),
    }
}

fn save_defaults(cmdline: &Config) -> i32 {
    let mut to_save = Config::load().unwrap_or_else(|_| Config::new());
    to_save.merge(cmdline);
    match to_save.save() {
        Ok(()) => {
            if let Ok(path) = Config::get_config_path() {
                println!("Defaults saved to {:?}", path);
                println!();
            }
            to_save.print("Saved configuration");
            0
        }
        Err(e) => {
            eprintln!("Error saving defaults: {}", e);
            1
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<Summary, Box<dyn std::error::Error>> {
    let user = config
        .user
        .clone()
        .or_else(config::listenbrainz_user)
        .ok_or("No user given: pass --user or set LB_USER")?;
    let token = config::listenbrainz_token()?;

    let mut listenbrainz = ListenBrainzClient::from_config(config, &token);
    let mut search = MusicBrainzSearch::from_config(config);
    let mut translator = CachingTranslator::from_config(config)?;
    let selector = MatchSelector::new(MatchSettings::from_config(config));

    if args.dry_run {
        println!("DRY RUN - no mappings will be submitted.");
        println!();
    }

    let listens = listenbrainz.fetch_listens(&user, config.count(), args.max_ts)?;
    log::info!("Fetched {} listens for {}", listens.len(), user);

    let results = Pipeline::new(&selector, &mut search, &mut translator, &mut listenbrainz)
        .dry_run(args.dry_run)
        .process(&listens);

    for result in &results {
        if let Some(line) = display_result(result) {
            println!("{}", line);
        }
    }
    Ok(Summary::from_results(&results))
}

fn main() {
    let args = Args::parse();
    config::load_dotenv();
    let cmdline = args.to_config();

    if args.show_defaults {
        show_defaults();
        process::exit(0);
    }
    if args.save_defaults {
        process::exit(save_defaults(&cmdline));
    }

    let config = Config::layered(&cmdline);
    init_logging(config.log_level());

    match run(&args, &config) {
        Ok(summary) => {
            println!();
            println!("{}", summary);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translator_args_keep_spaces_and_hyphens() {
        let args = Args::try_parse_from([
            "lbmap",
            "--translator-arg",
            "llm",
            "--translator-arg",
            "-m",
            "--translator-arg",
            "model with spaces",
            "--dry-run",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert_eq!(
            args.to_config().translator_command,
            Some(vec![
                "llm".to_string(),
                "-m".to_string(),
                "model with spaces".to_string()
            ])
        );
    }

    #[test]
    fn test_no_translator_args_leaves_config_unset() {
        let args = Args::try_parse_from(["lbmap", "--user", "someone"]).unwrap();
        assert_eq!(args.to_config().translator_command, None);
    }
}
