//! Simulate command implementation
//!
//! Generates one post, analyzes it and optionally posts an operator comment.

use serde::Serialize;

use super::common::{build_generator, emit};
use super::render;
use crate::{
    Article, BambooError, Comment, Config, ContentGenerator, GenerationError, Operation,
    PostSession, SimulationResult, SimulationSettings,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateOutput<'a> {
    article: &'a Article,
    analysis: Option<&'a SimulationResult>,
    comments: &'a [Comment],
}

/// One simulated post.
///
/// A failed reaction to the operator comment is kept apart from the session
/// so the comment that was already posted can still be shown.
pub struct Simulation {
    pub session: PostSession,
    pub reaction_error: Option<GenerationError>,
}

/// Generate a post, analyze it and post `comment` under it.
pub async fn simulate_post(
    generator: &ContentGenerator,
    settings: SimulationSettings,
    shadow_ban: bool,
    comment: Option<&str>,
    reveal_identity: bool,
) -> Result<Simulation, BambooError> {
    let article = generator
        .fetch_feed(1, settings)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::EmptyResponse {
            operation: Operation::Feed.as_str().to_string(),
        })?
        .with_shadow_ban(shadow_ban);

    let mut session = PostSession::new(article, settings);
    session.set_identity_revealed(reveal_identity);
    session.analyze(generator).await?;

    let reaction_error = match comment {
        Some(text) => session.comment(generator, text).await.err(),
        None => None,
    };
    Ok(Simulation {
        session,
        reaction_error,
    })
}

pub async fn execute_simulate_command(
    config: &Config,
    shadow_ban: bool,
    comment: Option<&str>,
    reveal_identity: bool,
    json: bool,
) -> Result<(), BambooError> {
    let generator = build_generator(config)?;
    let settings = SimulationSettings::from_config(config);
    let Simulation {
        session,
        reaction_error,
    } = simulate_post(&generator, settings, shadow_ban, comment, reveal_identity).await?;

    let output = SimulateOutput {
        article: session.article(),
        analysis: session.result(),
        comments: session.comments(),
    };
    emit(json, &output, || {
        let mut text = render::article_detail(session.article(), true);
        if let Some(result) = session.result() {
            text.push_str("\n\n");
            text.push_str(&render::indices(result));
        }
        text.push_str("\n\n");
        text.push_str(&render::thread(session.comments()));
        text
    })?;

    // The posted comment is already on screen; the failure still sets the exit code
    match reaction_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
