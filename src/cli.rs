use crate::config::CONFIG_FILE;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use insta_book::instagram::FeedFilter;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Filter options shared by `fetch` and `render`; each one overrides the
/// `[filter]` section of the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Only keep posts whose caption contains this tag (case-insensitive)
    #[arg(long)]
    pub hashtag: Option<String>,
    /// First day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD, UTC)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    /// Maximum number of posts to keep
    #[arg(long)]
    pub max_count: Option<NonZeroUsize>,
}

impl FilterArgs {
    pub fn apply_to(&self, filter: &FeedFilter) -> FeedFilter {
        FeedFilter {
            hashtag: self.hashtag.clone().or_else(|| filter.hashtag.clone()),
            start_date: self.start_date.or(filter.start_date),
            end_date: self.end_date.or(filter.end_date),
            max_count: self.max_count.unwrap_or(filter.max_count),
        }
    }
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Build from the posts file written by `fetch` instead of calling the API
    #[arg(long)]
    pub saved: bool,
    /// Where to write the EPUB (defaults to the configured outfile)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates an insta-book.toml config file
    Config,
    /// Downloads the feed, filters it and saves the posts file
    Fetch(FilterArgs),
    /// Renders the book according to the contents of the config file
    Render(RenderArgs),
    /// Removes the posts file and leftover work directories
    Clean,
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Instagram access token, bypassing the session file
    #[arg(long, global = true, env = "INSTAGRAM_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
