use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "medialink")]
#[command(author, version, about, long_about = None)]
#[command(about = "Build a normalized symlink media library from unstructured downloads")]
pub struct Args {
    /// Directory holding downloaded media (defaults to the saved setting)
    pub source: Option<PathBuf>,

    /// Library root where links are created (defaults to the saved setting)
    pub destination: Option<PathBuf>,

    /// Never prompt; always take the best-ranked match
    #[arg(short, long)]
    pub auto: bool,

    /// Put anime series under anime_shows/ instead of shows/
    #[arg(short, long)]
    pub split_dirs: bool,

    /// Treat files that match no episode pattern as movies
    #[arg(short, long)]
    pub movies: bool,

    /// Keep running, re-scanning the source periodically
    #[arg(short = 'l', long = "loop")]
    pub loop_mode: bool,

    /// Seconds to wait between passes in loop mode
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Settings file
    #[arg(short, long, value_name = "FILE", env = "MEDIALINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the link ledger and ignore list
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Store the given source and destination in the settings file
    #[arg(long)]
    pub save_settings: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
