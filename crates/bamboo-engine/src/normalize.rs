//! Response normalizer
//!
//! Turns raw structured responses into domain objects. Absent or unparsable
//! content is an error, never an empty default. On a shadow-banned article the
//! generated audience is cut down to the author and moderators, whatever the
//! generator produced.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use bamboo_utils::error::GenerationError;

use crate::model::{
    Article, ArticleCategory, ArticleId, Comment, CommentId, DmMessage, DmSimulationResult,
    Indices, RealIdentity, Reply, SimulationResult,
};
use crate::prompts::Operation;

/// Posted by the author when shadow-ban filtering leaves nothing
pub const FALLBACK_COMMENT: &str = "아니 왜 아무도 안 보냐 진짜... 내 글만 렉 걸림?";

/// Initial view counts are drawn from this range
const VIEW_COUNT_RANGE: std::ops::Range<u32> = 10..510;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: String,
    content: String,
    category: String,
    display_author: String,
    real_name: String,
    student_grade: i64,
    student_class: i64,
    #[serde(default)]
    likes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReply {
    username: String,
    #[serde(default)]
    real_identity: String,
    content: String,
    #[serde(default)]
    likes: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComment {
    username: String,
    #[serde(default)]
    real_identity: String,
    content: String,
    #[serde(default)]
    likes: i64,
    #[serde(default)]
    replies: Vec<RawReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIndices {
    teacher_suspicion: f64,
    atmosphere: f64,
    bullying_risk: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnalysis {
    indices: RawIndices,
    admin_tip: String,
    comments: Vec<RawComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDm {
    partner_name: String,
    relationship: String,
    is_two_faced: bool,
    logs: Vec<DmMessage>,
}

/// Parse `text` as the declared shape of `operation`.
fn parse<T: DeserializeOwned>(operation: Operation, text: &str) -> Result<T, GenerationError> {
    let trimmed = strip_code_fence(text.trim());
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyResponse {
            operation: operation.to_string(),
        });
    }
    serde_json::from_str(trimmed).map_err(|e| GenerationError::MalformedResponse {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

/// Remove a surrounding markdown code fence some models add around JSON.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn clamp_u8(value: i64, min: u8, max: u8) -> u8 {
    // Bounded by min/max so the cast cannot truncate
    value.clamp(i64::from(min), i64::from(max)) as u8
}

fn reply_from_raw(raw: RawReply) -> Reply {
    Reply {
        username: raw.username,
        real_identity: raw.real_identity,
        content: raw.content,
        likes: count(raw.likes),
        moderator: false,
    }
}

fn comment_from_raw(raw: RawComment) -> Comment {
    Comment {
        id: CommentId::generate(),
        username: raw.username,
        real_identity: raw.real_identity,
        content: raw.content,
        likes: count(raw.likes),
        replies: raw.replies.into_iter().map(reply_from_raw).collect(),
        moderator: false,
    }
}

fn article_from_raw(raw: RawArticle, index: usize, now: DateTime<Utc>) -> Article {
    let category = ArticleCategory::from_label(&raw.category).unwrap_or_else(|| {
        warn!(
            category = %raw.category,
            index = index,
            "Unknown category in generated post, using secret"
        );
        ArticleCategory::Secret
    });

    Article {
        id: ArticleId(format!("post-{}", uuid::Uuid::new_v4())),
        title: raw.title,
        category,
        content: raw.content,
        display_author: raw.display_author,
        real_identity: RealIdentity {
            grade: clamp_u8(raw.student_grade, 1, 3),
            class: clamp_u8(raw.student_class, 1, 12),
            name: raw.real_name,
        },
        created_at: now,
        likes: count(raw.likes).min(50),
        view_count: rand::rng().random_range(VIEW_COUNT_RANGE),
        admin_authored: false,
        shadow_banned: false,
    }
}

/// Normalize a feed response into new articles stamped with `now`.
///
/// # Errors
///
/// `EmptyResponse` for no content or an empty list, `MalformedResponse` when
/// the content is not a list of posts.
pub fn normalize_feed(text: &str, now: DateTime<Utc>) -> Result<Vec<Article>, GenerationError> {
    let raw: Vec<RawArticle> = parse(Operation::Feed, text)?;
    if raw.is_empty() {
        return Err(GenerationError::EmptyResponse {
            operation: Operation::Feed.to_string(),
        });
    }
    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, r)| article_from_raw(r, i, now))
        .collect())
}

fn written_by_author(article: &Article, real_identity: &str) -> bool {
    real_identity == article.real_name()
}

/// Drop every comment and reply not written by the author or a moderator.
///
/// If nothing survives, a single fallback comment in which the author wonders
/// why nobody answers takes its place. Articles that are not shadow banned are
/// returned unchanged.
#[must_use]
pub fn enforce_shadow_ban(article: &Article, comments: Vec<Comment>) -> Vec<Comment> {
    if !article.shadow_banned {
        return comments;
    }

    let before = comments.len();
    let mut kept: Vec<Comment> = comments
        .into_iter()
        .filter(|c| written_by_author(article, &c.real_identity) || c.is_moderator())
        .map(|mut c| {
            c.replies
                .retain(|r| written_by_author(article, &r.real_identity) || r.is_moderator());
            c
        })
        .collect();

    if kept.len() != before {
        debug!(
            article_id = %article.id,
            removed = before - kept.len(),
            "Removed comments hidden by shadow ban"
        );
    }

    if kept.is_empty() {
        kept.push(fallback_comment(article));
    }
    kept
}

/// The author's own "is anyone there?" comment
#[must_use]
pub fn fallback_comment(article: &Article) -> Comment {
    Comment {
        id: CommentId::generate(),
        username: article.display_author.clone(),
        real_identity: article.real_name().to_string(),
        content: FALLBACK_COMMENT.to_string(),
        likes: 0,
        replies: Vec::new(),
        moderator: false,
    }
}

/// Normalize an analysis response for `article` at its current shadow-ban state.
///
/// # Errors
///
/// `EmptyResponse` or `MalformedResponse` when the content is unusable.
pub fn normalize_analysis(
    text: &str,
    article: &Article,
) -> Result<SimulationResult, GenerationError> {
    let raw: RawAnalysis = parse(Operation::Analysis, text)?;
    let comments = raw.comments.into_iter().map(comment_from_raw).collect();
    Ok(SimulationResult {
        comments: enforce_shadow_ban(article, comments),
        indices: Indices {
            teacher_suspicion: raw.indices.teacher_suspicion,
            atmosphere: raw.indices.atmosphere,
            bullying_risk: raw.indices.bullying_risk,
        },
        admin_tip: raw.admin_tip,
    })
}

fn pin_to_author(article: &Article, reply: &mut Reply) {
    reply.username = article.display_author.clone();
    reply.real_identity = article.real_name().to_string();
}

/// Normalize the reaction to an operator reply: exactly one reply.
///
/// Extra entries are dropped. Under shadow ban the reply is attributed to the
/// article's author.
///
/// # Errors
///
/// `MalformedResponse` for an empty list, plus the usual parse failures.
pub fn normalize_reply_reaction(text: &str, article: &Article) -> Result<Reply, GenerationError> {
    let raw: Vec<RawReply> = parse(Operation::ReplyReaction, text)?;
    let total = raw.len();
    let mut reply = raw.into_iter().next().map(reply_from_raw).ok_or_else(|| {
        GenerationError::MalformedResponse {
            operation: Operation::ReplyReaction.to_string(),
            reason: "expected exactly one reply, got none".to_string(),
        }
    })?;
    if total > 1 {
        debug!(extra = total - 1, "Dropping extra reply reactions");
    }
    if article.shadow_banned {
        pin_to_author(article, &mut reply);
    }
    Ok(reply)
}

/// Normalize reactions to a new operator comment.
///
/// Under shadow ban only author or moderator replies survive and the first is
/// attributed to the author. An empty list is a valid "nobody reacted".
///
/// # Errors
///
/// `EmptyResponse` or `MalformedResponse` when the content is unusable.
pub fn normalize_new_comment_reaction(
    text: &str,
    article: &Article,
) -> Result<Vec<Reply>, GenerationError> {
    let raw: Vec<RawReply> = parse(Operation::NewCommentReaction, text)?;
    let mut replies: Vec<Reply> = raw.into_iter().map(reply_from_raw).collect();
    if article.shadow_banned {
        replies.retain(|r| written_by_author(article, &r.real_identity) || r.is_moderator());
        if let Some(first) = replies.first_mut() {
            pin_to_author(article, first);
        }
    }
    Ok(replies)
}

/// Normalize an intercepted conversation.
///
/// # Errors
///
/// `MalformedResponse` when the transcript has no messages, plus the usual
/// parse failures.
pub fn normalize_dm(text: &str) -> Result<DmSimulationResult, GenerationError> {
    let raw: RawDm = parse(Operation::DmIntercept, text)?;
    if raw.logs.is_empty() {
        return Err(GenerationError::MalformedResponse {
            operation: Operation::DmIntercept.to_string(),
            reason: "conversation has no messages".to_string(),
        });
    }
    if raw.logs.len() < crate::prompts::MIN_DM_MESSAGES as usize {
        debug!(messages = raw.logs.len(), "Short intercepted conversation");
    }
    Ok(DmSimulationResult {
        partner_name: raw.partner_name,
        relationship: raw.relationship,
        two_faced: raw.is_two_faced,
        messages: raw.logs,
    })
}
