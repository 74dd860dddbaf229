//! Plain-text rendering of board state for the terminal

use std::fmt::Write as _;

use crate::{Article, Comment, DmSender, DmSimulationResult, SimulationResult};

/// One-line feed entry
pub fn article_line(index: usize, article: &Article) -> String {
    let mut flags = String::new();
    if article.admin_authored {
        flags.push_str(" [운영자 글]");
    }
    if article.shadow_banned {
        flags.push_str(" [쉐도우 밴]");
    }
    format!(
        "{:>2}. [{}] {} - {} ♥{} 👁{}{flags}",
        index + 1,
        article.category,
        article.title,
        article.display_author,
        article.likes,
        article.view_count,
    )
}

pub fn article_detail(article: &Article, author_revealed: bool) -> String {
    let mut out = format!(
        "[{}] {}\n작성자: {}",
        article.category, article.title, article.display_author
    );
    if author_revealed {
        let _ = write!(out, " (실체: {})", article.real_identity);
    }
    let _ = write!(
        out,
        "\n{}\n♥{} 👁{} · {}",
        article.content,
        article.likes,
        article.view_count,
        article.created_at.format("%Y-%m-%d %H:%M"),
    );
    if article.shadow_banned {
        out.push_str("\n⛔ 쉐도우 밴 적용 중");
    }
    out
}

pub fn thread(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return "(댓글 없음)".to_string();
    }
    let mut out = String::new();
    for (i, c) in comments.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}] {} ({}) ♥{}\n    {}",
            i + 1,
            c.username,
            c.real_identity,
            c.likes,
            c.content
        );
        for r in &c.replies {
            let _ = writeln!(out, "    ㄴ {} ({}): {}", r.username, r.real_identity, r.content);
        }
    }
    out.trim_end().to_string()
}

/// Index line and operator tip
pub fn indices(result: &SimulationResult) -> String {
    format!(
        "선생님 감시 의심도 {:.0}% · 분위기 {:.0} · 학폭 위험도 {:.0}%\n💡 {}",
        result.indices.teacher_suspicion,
        result.indices.atmosphere,
        result.indices.bullying_risk,
        result.admin_tip,
    )
}

pub fn transcript(dm: &DmSimulationResult) -> String {
    let mut out = format!("📱 {} ({})", dm.partner_name, dm.relationship);
    if dm.two_faced {
        out.push_str(" ⚠️ 이중인격 감지");
    }
    for m in &dm.messages {
        let arrow = match m.sender {
            DmSender::Author => "▶",
            DmSender::Partner => "◀",
        };
        let _ = write!(out, "\n{arrow} {} [{}]: {}", m.sender_name, m.timestamp, m.message);
    }
    out
}
