//! The board feed
//!
//! Newest operator posts are prepended; generated batches are appended.

use chrono::Utc;
use tracing::info;

use bamboo_utils::error::GenerationError;

use crate::generator::ContentGenerator;
use crate::model::{
    ADMIN_ANONYMOUS_NAME, Article, ArticleCategory, ArticleId, EmergencyMode, RealIdentity,
    SimulationSettings,
};

/// Post written by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub category: ArticleCategory,
}

pub struct Feed {
    articles: Vec<Article>,
    settings: SimulationSettings,
    batch: u32,
}

impl Feed {
    #[must_use]
    pub fn new(settings: SimulationSettings, batch: u32) -> Self {
        Self {
            articles: Vec::new(),
            settings,
            batch,
        }
    }

    #[must_use]
    pub fn from_config(config: &bamboo_config::Config) -> Self {
        Self::new(SimulationSettings::from_config(config), config.feed_batch())
    }

    #[must_use]
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| &a.id == id)
    }

    #[must_use]
    pub fn settings(&self) -> SimulationSettings {
        self.settings
    }

    pub fn set_spicy(&mut self, spicy: bool) {
        self.settings.spicy = spicy;
    }

    pub fn set_emergency(&mut self, mode: EmergencyMode) {
        info!(emergency = %mode, "Emergency mode changed");
        self.settings.emergency = mode;
    }

    pub fn extend(&mut self, articles: Vec<Article>) {
        self.articles.extend(articles);
    }

    /// Write back an article changed elsewhere (e.g. its shadow-ban flag).
    pub fn update(&mut self, article: &Article) -> bool {
        match self.articles.iter_mut().find(|a| a.id == article.id) {
            Some(slot) => {
                *slot = article.clone();
                true
            }
            None => false,
        }
    }

    /// Generate and append one batch with the current settings.
    ///
    /// # Errors
    ///
    /// Any generation failure; the feed is left unchanged.
    pub async fn load_more(&mut self, generator: &ContentGenerator) -> Result<usize, GenerationError> {
        let articles = generator.fetch_feed(self.batch, self.settings).await?;
        let added = articles.len();
        self.extend(articles);
        Ok(added)
    }

    /// Publish an operator post at the top of the feed.
    pub fn compose_admin_post(&mut self, draft: PostDraft) -> &Article {
        let article = Article {
            id: ArticleId(format!("user-post-{}", uuid::Uuid::new_v4())),
            title: draft.title,
            category: draft.category,
            content: draft.content,
            display_author: ADMIN_ANONYMOUS_NAME.to_string(),
            real_identity: RealIdentity::admin(),
            created_at: Utc::now(),
            likes: 0,
            view_count: 0,
            admin_authored: true,
            shadow_banned: false,
        };
        info!(article_id = %article.id, "Operator post published");
        self.articles.insert(0, article);
        &self.articles[0]
    }

    /// Draft a follow-up post about `article`.
    #[must_use]
    pub fn follow_up_draft(article: &Article) -> PostDraft {
        PostDraft {
            title: format!("[후속] {}에 관하여", article.title),
            content: String::new(),
            category: ArticleCategory::Secret,
        }
    }
}
