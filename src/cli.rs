//! コマンドライン引数

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ScraperConfig, DEFAULT_CACHE_DIR, DEFAULT_MAX_DOWNLOADS};

/// Twitch VODのチャットリプレイを検索する
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-scraper", version, about = "Search the chat replays of Twitch VODs")]
pub struct Cli {
    /// IDs of the VODs whose chat replays should be searched
    #[arg(value_name = "VIDEO_ID", value_parser = parse_video_id)]
    pub video_ids: Vec<String>,

    /// Ruleset used to filter messages by their content (comma list or .json file)
    #[arg(long, value_name = "RULESET")]
    pub dict: Option<String>,

    /// Ruleset used to match usernames (every rule matches the whole name)
    #[arg(long, value_name = "RULESET")]
    pub users: Option<String>,

    /// Channel whose most recent VODs are added to the search
    #[arg(long, value_name = "CHANNEL")]
    pub vods_from: Option<String>,

    /// How many VODs to take from --vods-from
    #[arg(long, value_name = "N", default_value_t = 5)]
    pub max_vods: u32,

    /// Print a timestamped VOD link for each message
    #[arg(long)]
    pub print_links: bool,

    /// Don't use escape sequences to format the output
    #[arg(long)]
    pub plain: bool,

    /// Re-download chat replays even if they are cached
    #[arg(long, conflicts_with = "skip_cached")]
    pub force_download: bool,

    /// Skip VODs that are present in the cache
    #[arg(long)]
    pub skip_cached: bool,

    /// Only print the VOD IDs that would have been searched
    #[arg(long)]
    pub no_search: bool,

    /// Directory where chat replays are cached
    #[arg(long, env = "CHAT_SCRAPER_CACHE_DIR", default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Maximum number of chat replays downloaded at the same time
    #[arg(long, env = "CHAT_SCRAPER_MAX_DOWNLOADS", default_value_t = DEFAULT_MAX_DOWNLOADS)]
    pub max_downloads: usize,
}

impl Cli {
    /// 引数を反映したスクレイパー設定
    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            max_downloads: self.max_downloads,
            ..ScraperConfig::with_cache_dir(&self.cache_dir)
        }
    }
}

/// VOD IDは数字のみ
fn parse_video_id(value: &str) -> Result<String, String> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        Err(format!("'{}' is not a valid VOD ID", value))
    }
}
