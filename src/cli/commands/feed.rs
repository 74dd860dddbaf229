//! Feed command implementation

use super::common::{build_generator, emit};
use super::render;
use crate::{BambooError, Config, Feed};

/// Generate one batch of posts and print it.
pub async fn execute_feed_command(
    config: &Config,
    count: Option<u32>,
    json: bool,
) -> Result<(), BambooError> {
    let generator = build_generator(config)?;
    let articles = generator
        .fetch_feed(count.unwrap_or(config.feed_batch()), Feed::from_config(config).settings())
        .await?;

    emit(json, &articles, || {
        articles
            .iter()
            .enumerate()
            .map(|(i, a)| render::article_line(i, a))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
