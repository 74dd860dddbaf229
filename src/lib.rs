//! bamboo - simulated anonymous school board console
//!
//! bamboo simulates a Korean high-school "bamboo forest" board whose posts,
//! comment threads and private messages are generated on demand by a
//! structured-output LLM. The operator browses the feed, unmasks authors,
//! shadow-bans posts and watches the simulated students react.
//!
//! bamboo can be used in two ways:
//! - **CLI**: `bamboo feed`, `bamboo simulate`, `bamboo intercept`,
//!   `bamboo config` and the interactive `bamboo console`
//! - **Library**: drive a [`Feed`] and [`PostSession`] with a
//!   [`ContentGenerator`] from your own presentation layer
//!
//! # Quick Start (Library)
//!
//! ```rust,no_run
//! use bamboo::{Config, ContentGenerator, Feed, PostSession};
//!
//! # async fn demo() -> Result<(), bamboo::BambooError> {
//! let config = Config::builder().spicy(true).build()?;
//! let generator = ContentGenerator::from_config(&config)?;
//!
//! let mut feed = Feed::from_config(&config);
//! feed.load_more(&generator).await?;
//!
//! let mut session = PostSession::new(feed.articles()[0].clone(), feed.settings());
//! session.analyze(&generator).await?;
//! session.toggle_and_reanalyze(&generator).await?;
//! assert!(session.article().shadow_banned);
//! # Ok(())
//! # }
//! ```
//!
//! # Shadow ban
//!
//! Whatever the generator returns, a shadow-banned post only ever shows
//! comments and replies by its own author or by moderators. If nothing
//! survives, the author's lonely fallback comment is shown instead.
//!
//! # Stable Public API
//!
//! - [`Config`], [`ConfigBuilder`], [`CliArgs`] - configuration
//! - [`ContentGenerator`] - the five generation operations
//! - [`Feed`], [`PostSession`], [`DmIntercept`] - operator state machines
//! - [`BambooError`], [`GenerationError`], [`ExitCode`] - errors and exit codes

pub mod cli;

pub use bamboo_config::{CliArgs, Config, ConfigBuilder, ConfigSource};

pub use bamboo_engine::{
    AdminPersona, AnalysisState, AnalysisTicket, Article, ArticleCategory, ArticleId, Comment,
    CommentId, ContentGenerator, DmIntercept, DmMessage, DmSender, DmSimulationResult,
    EmergencyMode, FALLBACK_COMMENT, Feed, GenerationRequest, Indices, InterceptState, Operation,
    PendingReaction, PostDraft, PostSession, ReactionKind, ReactionOutcome, RealIdentity, Reply,
    SimulationResult, SimulationSettings, enforce_shadow_ban,
};

pub use bamboo_llm::{LlmBackend, LlmInvocation, LlmResult, RetryPolicy, Schema};

pub use bamboo_utils::error::{
    BambooError, ConfigError, ErrorCategory, GenerationError, LlmError, UserFriendlyError,
};
pub use bamboo_utils::exit_codes::ExitCode;
