use crate::cli::FilterArgs;
use crate::config::{Configuration, GraphConfig};
use anyhow::{Context, Result};
use insta_book::instagram::{
    filter, FileSessionResolver, GraphClient, MediaItem, MediaSource, SessionResolver, INSTAGRAM,
};
use std::path::Path;
use std::time::Duration;

/// The HTTP client shared by the Graph API calls and media downloads.
pub fn http_client(graph: &GraphConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(graph.timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .with_context(|| "Failed to build HTTP client")
}

/// Resolve the user's token and list their whole (unfiltered) feed.
pub async fn fetch_feed(
    config: &Configuration,
    client: reqwest::Client,
    access_token: Option<String>,
) -> Result<Vec<MediaItem>> {
    let resolver =
        FileSessionResolver::new(&config.auth.session_file).with_token_override(access_token);
    let token = resolver
        .resolve_access_token(INSTAGRAM)
        .await
        .with_context(|| {
            format!(
                "Failed to resolve Instagram access token (session file {})",
                resolver.session_file().display()
            )
        })?;

    let items = GraphClient::new(client, config.graph.base_url.clone())
        .with_max_pages(config.graph.max_pages)
        .list_media(&token)
        .await
        .with_context(|| "Failed to fetch Instagram feed")?;
    log::info!("fetched {} post(s)", items.len());
    Ok(items)
}

pub fn save_posts(path: &Path, items: &[MediaItem]) -> Result<()> {
    let json = serde_json::to_string_pretty(items)
        .with_context(|| "Failed to convert posts to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write posts file {}", path.display()))
}

pub fn load_posts(path: &Path) -> Result<Vec<MediaItem>> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read posts file {} (run `insta-book fetch` first)",
            path.display()
        )
    })?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse posts file {}", path.display()))
}

pub async fn run(config: &Configuration, access_token: Option<String>, args: &FilterArgs) -> Result<()> {
    let client = http_client(&config.graph)?;
    let items = fetch_feed(config, client, access_token).await?;
    let items = filter::apply(&items, &args.apply_to(&config.filter));

    let posts_file = &config.output.posts_file;
    save_posts(posts_file, &items)?;
    println!("{} post(s) saved to {}", items.len(), posts_file.display());
    Ok(())
}
