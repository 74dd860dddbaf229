//! Board simulation engine for bamboo
//!
//! The engine owns the domain model, builds generation requests, normalizes
//! responses and keeps the per-post state machines the operator console
//! drives. All network access goes through [`ContentGenerator`].

mod feed;
mod generator;
mod intercept;
pub mod model;
pub mod normalize;
pub mod prompts;
mod session;

pub use feed::{Feed, PostDraft};
pub use generator::ContentGenerator;
pub use intercept::{DmIntercept, InterceptState};
pub use model::*;
pub use normalize::{FALLBACK_COMMENT, enforce_shadow_ban};
pub use prompts::{GenerationRequest, MAX_FEED_BATCH, Operation};
pub use session::{
    AnalysisState, AnalysisTicket, PendingReaction, PostSession, ReactionKind, ReactionOutcome,
};

pub use bamboo_utils::error::GenerationError;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::model::{Article, ArticleCategory, ArticleId, Comment, CommentId, RealIdentity};

    /// Open article by 2학년 7반 김민지
    pub fn sample_article() -> Article {
        Article {
            id: ArticleId("post-1".to_string()),
            title: "급식 또 카레임".to_string(),
            category: ArticleCategory::Lunch,
            content: "이번주만 세번째 카레 실화냐".to_string(),
            display_author: "익명".to_string(),
            real_identity: RealIdentity {
                grade: 2,
                class: 7,
                name: "김민지".to_string(),
            },
            created_at: Utc::now(),
            likes: 3,
            view_count: 120,
            admin_authored: false,
            shadow_banned: false,
        }
    }

    pub fn student_comment(name: &str, content: &str) -> Comment {
        Comment {
            id: CommentId::generate(),
            username: "익명".to_string(),
            real_identity: name.to_string(),
            content: content.to_string(),
            likes: 0,
            replies: Vec::new(),
            moderator: false,
        }
    }
}
