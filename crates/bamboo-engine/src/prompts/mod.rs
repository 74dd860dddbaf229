//! Prompt builders
//!
//! Each builder is a pure function from domain state to a [`GenerationRequest`]:
//! prompt text plus the schema the response must follow. None of them touch
//! the network; [`crate::ContentGenerator`] sends the request.

mod analysis;
mod dm;
mod feed;
mod reaction;

pub use analysis::analysis_request;
pub use dm::{MIN_DM_MESSAGES, dm_request};
pub use feed::{MAX_FEED_BATCH, feed_request};
pub use reaction::{new_comment_reaction_request, reply_reaction_request};

use bamboo_llm::Schema;
use std::fmt;

/// The five generation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Feed,
    Analysis,
    ReplyReaction,
    NewCommentReaction,
    DmIntercept,
}

impl Operation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Analysis => "analysis",
            Self::ReplyReaction => "reply-reaction",
            Self::NewCommentReaction => "new-comment-reaction",
            Self::DmIntercept => "dm-intercept",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formed request for the generation service
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub operation: Operation,
    pub prompt: String,
    pub schema: Schema,
}

/// Voice rule shared by every prompt: students born 2007 to 2009
pub(crate) const VOICE_RULE: &str =
    "말투는 07~09년생 고등학생 말투(급식체, 초성) 필수.";

/// Vocabulary rule shared by every prompt
pub(crate) const NO_UNIVERSITY_RULE: &str =
    "대학교 관련 용어(학번, 학과 등)는 절대 사용 금지.";

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag { "네" } else { "아니오" }
}

/// Schema of a single reply object, shared by both reaction requests
pub(crate) fn reply_schema() -> Schema {
    Schema::object()
        .property("username", Schema::string())
        .property("realIdentity", Schema::string())
        .property("content", Schema::string())
        .property("likes", Schema::integer())
}
