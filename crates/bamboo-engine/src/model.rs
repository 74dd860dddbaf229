//! Domain model of the simulated board
//!
//! Every entity here is produced by a generation call (or by the operator) and
//! lives only in memory. Serialisation is camelCase so the CLI can print the
//! same shapes the generation service returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Real identity recorded for posts written by the operator
pub const ADMIN_REAL_IDENTITY: &str = "관리자(본인)";

/// Username the operator posts under when revealing themselves
pub const ADMIN_REVEALED_NAME: &str = "👑운영자";

/// Username the operator posts under while anonymous
pub const ADMIN_ANONYMOUS_NAME: &str = "익명(나)";

/// Tag that marks moderator-authored content in a username
pub const MODERATOR_TAG: &str = "운영자";

/// Board category. Serialised with the Korean label shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleCategory {
    #[serde(rename = "뒷담화")]
    Gossip,
    #[serde(rename = "고백/짝사랑")]
    Confession,
    #[serde(rename = "시험/성적")]
    Academic,
    #[serde(rename = "선생님")]
    Teachers,
    #[serde(rename = "급식/매점")]
    Lunch,
    #[serde(rename = "분실물")]
    LostAndFound,
    #[serde(rename = "저격/싸움")]
    Fight,
    #[serde(rename = "비밀")]
    Secret,
}

impl ArticleCategory {
    pub const ALL: [ArticleCategory; 8] = [
        Self::Gossip,
        Self::Confession,
        Self::Academic,
        Self::Teachers,
        Self::Lunch,
        Self::LostAndFound,
        Self::Fight,
        Self::Secret,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Gossip => "뒷담화",
            Self::Confession => "고백/짝사랑",
            Self::Academic => "시험/성적",
            Self::Teachers => "선생님",
            Self::Lunch => "급식/매점",
            Self::LostAndFound => "분실물",
            Self::Fight => "저격/싸움",
            Self::Secret => "비밀",
        }
    }

    /// Match a label as generated; surrounding whitespace is ignored.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for ArticleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who actually wrote something. Only the operator ever sees this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealIdentity {
    /// 1..=3 for students, 0 for the operator
    pub grade: u8,
    /// 1..=12 for students, 0 for the operator
    pub class: u8,
    pub name: String,
}

impl RealIdentity {
    #[must_use]
    pub fn admin() -> Self {
        Self {
            grade: 0,
            class: 0,
            name: ADMIN_REAL_IDENTITY.to_string(),
        }
    }
}

impl fmt::Display for RealIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}학년 {}반 {}", self.grade, self.class, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub String);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable comment identifier; reactions are addressed by it, never by position
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("cmt-{}", uuid::Uuid::new_v4()))
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub category: ArticleCategory,
    pub content: String,
    /// Pseudonym ordinary students see
    pub display_author: String,
    pub real_identity: RealIdentity,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub view_count: u32,
    /// Written by the operator rather than generated
    pub admin_authored: bool,
    pub shadow_banned: bool,
}

impl Article {
    /// Real name used for shadow-ban comparisons
    #[must_use]
    pub fn real_name(&self) -> &str {
        &self.real_identity.name
    }

    /// Author line given to prompts
    #[must_use]
    pub fn author_description(&self) -> String {
        if self.admin_authored {
            "운영자(관리자)가 익명으로 작성함.".to_string()
        } else {
            self.real_identity.to_string()
        }
    }

    /// Copy of this article with the shadow-ban flag set to `banned`
    #[must_use]
    pub fn with_shadow_ban(&self, banned: bool) -> Self {
        Self {
            shadow_banned: banned,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub username: String,
    #[serde(default)]
    pub real_identity: String,
    pub content: String,
    pub likes: u32,
    /// Written by the operator
    #[serde(default)]
    pub moderator: bool,
}

impl Reply {
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.moderator || self.username.contains(MODERATOR_TAG)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub username: String,
    pub real_identity: String,
    pub content: String,
    pub likes: u32,
    /// Newest last
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub moderator: bool,
}

impl Comment {
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.moderator || self.username.contains(MODERATOR_TAG)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indices {
    /// Percentage
    pub teacher_suspicion: f64,
    pub atmosphere: f64,
    /// Percentage
    pub bullying_risk: f64,
}

/// Output of one analysis call. Replaced wholesale on every re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub comments: Vec<Comment>,
    pub indices: Indices,
    pub admin_tip: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmSender {
    #[serde(rename = "AUTHOR")]
    Author,
    #[serde(rename = "TARGET")]
    Partner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmMessage {
    pub sender: DmSender,
    pub sender_name: String,
    pub message: String,
    /// Display string such as "오후 2:31"
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DmSimulationResult {
    pub partner_name: String,
    pub relationship: String,
    pub two_faced: bool,
    pub messages: Vec<DmMessage>,
}

/// Scenario bias applied to every generation call while set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmergencyMode {
    #[default]
    None,
    TeacherRaid,
    PoliceAlert,
}

impl EmergencyMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TeacherRaid => "teacher-raid",
            Self::PoliceAlert => "police-alert",
        }
    }
}

impl fmt::Display for EmergencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "teacher-raid" => Ok(Self::TeacherRaid),
            "police-alert" => Ok(Self::PoliceAlert),
            other => Err(format!(
                "unknown emergency mode '{other}' (expected none, teacher-raid or police-alert)"
            )),
        }
    }
}

/// Tone settings passed explicitly into each generation operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub spicy: bool,
    pub emergency: EmergencyMode,
}

impl SimulationSettings {
    /// Settings from configuration; an unrecognised emergency name falls back to none
    #[must_use]
    pub fn from_config(config: &bamboo_config::Config) -> Self {
        Self {
            spicy: config.spicy(),
            emergency: config.emergency().parse().unwrap_or_default(),
        }
    }
}

/// How the operator appears when posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminPersona {
    pub revealed: bool,
}

impl AdminPersona {
    #[must_use]
    pub fn username(self) -> &'static str {
        if self.revealed {
            ADMIN_REVEALED_NAME
        } else {
            ADMIN_ANONYMOUS_NAME
        }
    }

    #[must_use]
    pub fn comment(self, content: impl Into<String>) -> Comment {
        Comment {
            id: CommentId::generate(),
            username: self.username().to_string(),
            real_identity: ADMIN_REAL_IDENTITY.to_string(),
            content: content.into(),
            likes: 0,
            replies: Vec::new(),
            moderator: true,
        }
    }

    #[must_use]
    pub fn reply(self, content: impl Into<String>) -> Reply {
        Reply {
            username: self.username().to_string(),
            real_identity: ADMIN_REAL_IDENTITY.to_string(),
            content: content.into(),
            likes: 0,
            moderator: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_labels_round_trip() {
        for category in ArticleCategory::ALL {
            assert_eq!(ArticleCategory::from_label(category.label()), Some(category));
        }
        assert_eq!(
            ArticleCategory::from_label(" 급식/매점 "),
            Some(ArticleCategory::Lunch)
        );
        assert_eq!(ArticleCategory::from_label("동아리"), None);
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&ArticleCategory::Fight).unwrap();
        assert_eq!(json, "\"저격/싸움\"");
    }

    #[test]
    fn test_emergency_parsing() {
        assert_eq!("teacher-raid".parse::<EmergencyMode>(), Ok(EmergencyMode::TeacherRaid));
        assert_eq!("POLICE_ALERT".parse::<EmergencyMode>(), Ok(EmergencyMode::PoliceAlert));
        assert!("zombies".parse::<EmergencyMode>().is_err());
    }

    #[test]
    fn test_admin_persona_names() {
        let anon = AdminPersona { revealed: false }.comment("hi");
        assert_eq!(anon.username, ADMIN_ANONYMOUS_NAME);
        assert!(anon.is_moderator());
        assert_eq!(anon.real_identity, ADMIN_REAL_IDENTITY);

        let revealed = AdminPersona { revealed: true }.reply("hi");
        assert_eq!(revealed.username, ADMIN_REVEALED_NAME);
    }

    #[test]
    fn test_moderator_tag_in_username() {
        let reply = Reply {
            username: "운영자님".to_string(),
            real_identity: "?".to_string(),
            content: "..".to_string(),
            likes: 0,
            moderator: false,
        };
        assert!(reply.is_moderator());
    }

    #[test]
    fn test_identity_display() {
        let id = RealIdentity {
            grade: 2,
            class: 7,
            name: "김민지".to_string(),
        };
        assert_eq!(id.to_string(), "2학년 7반 김민지");
    }
}
