//! Intercept command implementation

use serde::Serialize;

use super::common::{build_generator, emit};
use super::render;
use crate::{Article, BambooError, Config, DmIntercept, DmSimulationResult, Feed};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InterceptOutput<'a> {
    article: &'a Article,
    transcript: &'a DmSimulationResult,
}

/// Generate one post and intercept its author's private conversation.
pub async fn execute_intercept_command(config: &Config, json: bool) -> Result<(), BambooError> {
    let generator = build_generator(config)?;
    let settings = Feed::from_config(config).settings();
    let Some(article) = generator.fetch_feed(1, settings).await?.into_iter().next() else {
        return Ok(());
    };

    let mut intercept = DmIntercept::new(article.clone());
    let transcript = intercept.run(&generator).await?;

    let output = InterceptOutput {
        article: &article,
        transcript,
    };
    emit(json, &output, || {
        format!(
            "{}\n\n{}",
            render::article_detail(&article, true),
            render::transcript(transcript)
        )
    })
}
