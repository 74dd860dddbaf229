//! Per-post simulation session
//!
//! A [`PostSession`] is the state machine behind one opened article:
//!
//! ```text
//! Loading ──ok──▶ Ready ──toggle──▶ ReAnalyzing ──ok──▶ Ready
//!    │                                   │
//!    └──err──▶ Failed                    └──err──▶ Ready (flag restored)
//! ```
//!
//! Analysis runs are identified by [`AnalysisTicket`]s. Only the most recently
//! issued ticket may apply its result, so a slow response to an earlier toggle
//! can never overwrite a newer one.
//!
//! Operator comments and replies are appended immediately and return a
//! [`PendingReaction`] naming the target comment by id together with the
//! thread epoch. Every wholesale replacement of the thread bumps the epoch,
//! and reactions from an older epoch are discarded instead of being attached
//! to whatever now sits at that position.

use tracing::{debug, info, warn};

use bamboo_utils::error::GenerationError;

use crate::generator::ContentGenerator;
use crate::model::{
    AdminPersona, Article, Comment, CommentId, RealIdentity, Reply, SimulationResult,
    SimulationSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// First analysis in flight; nothing to show yet
    Loading,
    Ready,
    /// A re-analysis is in flight; the previous thread stays interactive
    ReAnalyzing,
    /// The first analysis failed
    Failed,
}

/// Handle for one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    seq: u64,
    article: Article,
    settings: SimulationSettings,
}

impl AnalysisTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Article snapshot, including the shadow-ban flag, this run analyzes
    #[must_use]
    pub fn article(&self) -> &Article {
        &self.article
    }

    /// Run the analysis for this ticket.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn run(
        &self,
        generator: &ContentGenerator,
    ) -> Result<SimulationResult, GenerationError> {
        generator.analyze(&self.article, self.settings).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionKind {
    /// Students react to a new operator comment
    NewComment,
    /// The commenter answers the operator's reply
    Reply { text: String },
}

/// Correlation between an optimistic append and the reaction it awaits
#[derive(Debug, Clone)]
pub struct PendingReaction {
    comment_id: CommentId,
    epoch: u64,
    kind: ReactionKind,
    article: Article,
    comment: Comment,
    identity_revealed: bool,
}

impl PendingReaction {
    #[must_use]
    pub fn comment_id(&self) -> &CommentId {
        &self.comment_id
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn kind(&self) -> &ReactionKind {
        &self.kind
    }

    /// Generate the reaction replies.
    ///
    /// # Errors
    ///
    /// Any generation failure.
    pub async fn generate(
        &self,
        generator: &ContentGenerator,
    ) -> Result<Vec<Reply>, GenerationError> {
        match &self.kind {
            ReactionKind::NewComment => {
                generator
                    .react_to_new_comment(&self.article, &self.comment, self.identity_revealed)
                    .await
            }
            ReactionKind::Reply { text } => generator
                .react_to_reply(&self.article, &self.comment, text, self.identity_revealed)
                .await
                .map(|reply| vec![reply]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Replies appended to the target comment
    Applied(usize),
    /// The thread was replaced after the reaction was requested
    StaleEpoch,
    /// No comment with that id exists in the current thread
    UnknownComment,
}

pub struct PostSession {
    article: Article,
    settings: SimulationSettings,
    state: AnalysisState,
    result: Option<SimulationResult>,
    /// Shadow-ban flag the displayed result was generated under
    displayed_shadow_ban: bool,
    comments: Vec<Comment>,
    epoch: u64,
    issued: u64,
    latest: Option<u64>,
    identity_revealed: bool,
    author_revealed: bool,
    last_error: Option<GenerationError>,
}

impl PostSession {
    /// Open `article`. The session starts in `Loading` until the first
    /// analysis is applied.
    #[must_use]
    pub fn new(article: Article, settings: SimulationSettings) -> Self {
        let displayed_shadow_ban = article.shadow_banned;
        Self {
            article,
            settings,
            state: AnalysisState::Loading,
            result: None,
            displayed_shadow_ban,
            comments: Vec::new(),
            epoch: 0,
            issued: 0,
            latest: None,
            identity_revealed: false,
            author_revealed: false,
            last_error: None,
        }
    }

    #[must_use]
    pub fn article(&self) -> &Article {
        &self.article
    }

    #[must_use]
    pub fn state(&self) -> AnalysisState {
        self.state
    }

    /// Most recently applied analysis
    #[must_use]
    pub fn result(&self) -> Option<&SimulationResult> {
        self.result.as_ref()
    }

    /// Live comment list: the last analysis plus operator additions
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn find_comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn settings(&self) -> SimulationSettings {
        self.settings
    }

    #[must_use]
    pub fn identity_revealed(&self) -> bool {
        self.identity_revealed
    }

    #[must_use]
    pub fn author_revealed(&self) -> bool {
        self.author_revealed
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    pub fn set_spicy(&mut self, spicy: bool) {
        self.settings.spicy = spicy;
    }

    /// Whether the operator posts as `👑운영자` from now on
    pub fn set_identity_revealed(&mut self, revealed: bool) {
        self.identity_revealed = revealed;
    }

    /// Unmask the author's real identity for the operator.
    pub fn reveal_author(&mut self) -> &RealIdentity {
        if !self.author_revealed {
            info!(article_id = %self.article.id, "Author identity revealed");
        }
        self.author_revealed = true;
        &self.article.real_identity
    }

    /// Issue a ticket analyzing the article as it stands now.
    pub fn begin_analysis(&mut self) -> AnalysisTicket {
        self.issued += 1;
        self.latest = Some(self.issued);
        self.state = if self.result.is_some() {
            AnalysisState::ReAnalyzing
        } else {
            AnalysisState::Loading
        };
        debug!(
            article_id = %self.article.id,
            ticket = self.issued,
            shadow_banned = self.article.shadow_banned,
            "Analysis requested"
        );
        AnalysisTicket {
            seq: self.issued,
            article: self.article.clone(),
            settings: self.settings,
        }
    }

    /// Flip the shadow-ban flag and issue the re-analysis it requires.
    pub fn toggle_shadow_ban(&mut self) -> AnalysisTicket {
        self.article.shadow_banned = !self.article.shadow_banned;
        info!(
            article_id = %self.article.id,
            shadow_banned = self.article.shadow_banned,
            "Shadow ban toggled"
        );
        self.begin_analysis()
    }

    fn is_latest(&self, ticket: &AnalysisTicket) -> bool {
        self.latest == Some(ticket.seq)
    }

    /// Apply the result of `ticket`, replacing the thread wholesale.
    ///
    /// Returns `false` and leaves the session untouched when a newer ticket
    /// has been issued since.
    pub fn apply_analysis(&mut self, ticket: &AnalysisTicket, result: SimulationResult) -> bool {
        if !self.is_latest(ticket) {
            debug!(
                article_id = %self.article.id,
                ticket = ticket.seq,
                latest = ?self.latest,
                "Discarding stale analysis"
            );
            return false;
        }

        self.comments = result.comments.clone();
        self.result = Some(result);
        self.displayed_shadow_ban = ticket.article.shadow_banned;
        self.epoch += 1;
        self.latest = None;
        self.state = AnalysisState::Ready;
        self.last_error = None;
        true
    }

    /// Record the failure of `ticket`.
    ///
    /// With a result on screen the session returns to `Ready` and the
    /// shadow-ban flag goes back to the value that result was generated
    /// under. Without one it becomes `Failed`. Stale tickets are ignored.
    pub fn fail_analysis(&mut self, ticket: &AnalysisTicket, error: GenerationError) -> bool {
        if !self.is_latest(ticket) {
            debug!(ticket = ticket.seq, "Ignoring failure of stale analysis");
            return false;
        }

        warn!(article_id = %self.article.id, error = %error, "Analysis failed");
        self.latest = None;
        if self.result.is_some() {
            self.article.shadow_banned = self.displayed_shadow_ban;
            self.state = AnalysisState::Ready;
        } else {
            self.state = AnalysisState::Failed;
        }
        self.last_error = Some(error);
        true
    }

    /// Append an operator comment and return the reaction it awaits.
    pub fn post_comment(&mut self, text: impl Into<String>) -> PendingReaction {
        let comment = AdminPersona {
            revealed: self.identity_revealed,
        }
        .comment(text);
        let pending = PendingReaction {
            comment_id: comment.id.clone(),
            epoch: self.epoch,
            kind: ReactionKind::NewComment,
            article: self.article.clone(),
            comment: comment.clone(),
            identity_revealed: self.identity_revealed,
        };
        self.comments.push(comment);
        pending
    }

    /// Append an operator reply under `comment_id`.
    ///
    /// Returns `None` when no such comment is in the current thread.
    pub fn reply_to(
        &mut self,
        comment_id: &CommentId,
        text: impl Into<String>,
    ) -> Option<PendingReaction> {
        let text = text.into();
        let persona = AdminPersona {
            revealed: self.identity_revealed,
        };
        let target = self.comments.iter_mut().find(|c| &c.id == comment_id)?;
        let snapshot = target.clone();
        target.replies.push(persona.reply(text.clone()));

        Some(PendingReaction {
            comment_id: comment_id.clone(),
            epoch: self.epoch,
            kind: ReactionKind::Reply { text },
            article: self.article.clone(),
            comment: snapshot,
            identity_revealed: self.identity_revealed,
        })
    }

    /// Attach reaction `replies` to the comment `pending` names.
    pub fn apply_reaction(&mut self, pending: &PendingReaction, replies: Vec<Reply>) -> ReactionOutcome {
        if pending.epoch != self.epoch {
            debug!(
                comment_id = %pending.comment_id,
                epoch = pending.epoch,
                current = self.epoch,
                "Discarding reaction for replaced thread"
            );
            return ReactionOutcome::StaleEpoch;
        }
        let Some(target) = self.comments.iter_mut().find(|c| c.id == pending.comment_id) else {
            debug!(comment_id = %pending.comment_id, "Reaction target no longer exists");
            return ReactionOutcome::UnknownComment;
        };
        let count = replies.len();
        target.replies.extend(replies);
        ReactionOutcome::Applied(count)
    }

    /// Issue, run and apply an analysis of the current article.
    ///
    /// # Errors
    ///
    /// The generation failure, after it has been recorded.
    pub async fn analyze(&mut self, generator: &ContentGenerator) -> Result<(), GenerationError> {
        let ticket = self.begin_analysis();
        self.finish_analysis(&ticket, generator).await
    }

    /// Toggle the shadow ban and re-analyze.
    ///
    /// # Errors
    ///
    /// The generation failure; the flag is restored if a result is on screen.
    pub async fn toggle_and_reanalyze(
        &mut self,
        generator: &ContentGenerator,
    ) -> Result<(), GenerationError> {
        let ticket = self.toggle_shadow_ban();
        self.finish_analysis(&ticket, generator).await
    }

    async fn finish_analysis(
        &mut self,
        ticket: &AnalysisTicket,
        generator: &ContentGenerator,
    ) -> Result<(), GenerationError> {
        match ticket.run(generator).await {
            Ok(result) => {
                self.apply_analysis(ticket, result);
                Ok(())
            }
            Err(e) => {
                self.fail_analysis(ticket, e.clone());
                Err(e)
            }
        }
    }

    /// Post a comment and attach the generated reactions.
    ///
    /// # Errors
    ///
    /// The reaction failure. The comment itself stays in the thread.
    pub async fn comment(
        &mut self,
        generator: &ContentGenerator,
        text: impl Into<String>,
    ) -> Result<ReactionOutcome, GenerationError> {
        let pending = self.post_comment(text);
        let replies = pending.generate(generator).await?;
        Ok(self.apply_reaction(&pending, replies))
    }

    /// Reply to a comment and attach the commenter's reaction.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an unknown comment id, otherwise the reaction
    /// failure. The operator's reply stays in the thread either way.
    pub async fn reply(
        &mut self,
        generator: &ContentGenerator,
        comment_id: &CommentId,
        text: impl Into<String>,
    ) -> Result<ReactionOutcome, GenerationError> {
        let pending = self
            .reply_to(comment_id, text)
            .ok_or_else(|| GenerationError::InvalidRequest {
                reason: format!("no comment with id {comment_id}"),
            })?;
        let replies = pending.generate(generator).await?;
        Ok(self.apply_reaction(&pending, replies))
    }
}
