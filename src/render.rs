use crate::cli::RenderArgs;
use crate::config::{default_epub_name, Configuration};
use crate::fetch::{fetch_feed, http_client, load_posts};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use insta_book::epub::{
    ChromeCoverRenderer, EpubAssembler, EpubInput, EpubPackager, HttpDownloader,
};
use insta_book::instagram::filter;
use std::path::PathBuf;
use std::sync::Arc;

/// Prefix of the per-build work directories in the system temp dir.
pub const WORK_DIR_PREFIX: &str = "insta-book-";

pub async fn run(config: &Configuration, access_token: Option<String>, args: &RenderArgs) -> Result<()> {
    let client = http_client(&config.graph)?;
    let items = if args.saved {
        println!("Loading saved posts...");
        load_posts(&config.output.posts_file)?
    } else {
        println!("Fetching feed...");
        fetch_feed(config, client.clone(), access_token).await?
    };

    let filter = args.filter.apply_to(&config.filter);
    let items = filter::apply(&items, &filter);
    if items.is_empty() {
        bail!("no posts matched the filter");
    }
    let outfile = args
        .outfile
        .clone()
        .or_else(|| config.output.outfile.clone())
        .unwrap_or_else(|| default_epub_name(&filter));

    let work_dir = tempfile::Builder::new()
        .prefix(WORK_DIR_PREFIX)
        .tempdir()
        .with_context(|| "Failed to create work directory")?;
    log::debug!("work directory: {}", work_dir.path().display());

    let assembler = EpubAssembler::new(
        config.layout.source(),
        Arc::new(HttpDownloader::new(client)),
        Arc::new(ChromeCoverRenderer {
            chrome_path: config.layout.chrome_path.clone(),
        }),
        Arc::new(EpubPackager),
    )
    .validate(config.layout.validate);

    let progress = ProgressBar::new(items.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .with_context(|| "Failed to parse progress style")?
            .progress_chars("#>-"),
    );

    let input = EpubInput {
        metadata: config.metadata.clone(),
        items,
    };
    let epub = match assembler.build(&input, work_dir.path(), &progress).await {
        Ok(epub) => epub,
        Err(e) => {
            progress.abandon();
            let kept: PathBuf = work_dir.keep();
            return Err(e).with_context(|| {
                format!(
                    "Failed to render EPUB (work files kept in {})",
                    kept.display()
                )
            });
        }
    };
    progress.finish_with_message("Done");

    std::fs::copy(&epub, &outfile)
        .with_context(|| format!("Failed to write {}", outfile.display()))?;

    println!();
    println!("  Posts: {}", input.items.len());
    println!("  EPUB:  {}", outfile.display());
    Ok(())
}
