use bamboo_llm::Schema;

use super::{GenerationRequest, NO_UNIVERSITY_RULE, Operation, VOICE_RULE};
use crate::model::Article;

fn mood(spicy: bool) -> &'static str {
    if spicy {
        "학생들은 예민하고 공격적임. 서로 물어뜯거나 비꼼. 욕설 필터링 없이 리얼하게."
    } else {
        "학생들은 장난스럽고 친구 같은 분위기. 'ㅋㅋㅋ' 남발."
    }
}

/// Hard isolation block used while the article is shadow banned
fn shadow_ban_block(article: &Article) -> String {
    let name = article.real_name();
    let display = &article.display_author;
    format!(
        "[⛔️ 중요: 쉐도우 밴(Shadow Ban) 적용됨]
이 게시글은 작성자({name}, 표시명: {display})를 제외한 **그 어떤 다른 학생에게도 절대 보이지 않습니다.**

[필수 행동 수칙]
1. **다른 학생의 댓글은 0개여야 합니다. 단 1개도 허용하지 않습니다.**
2. 오직 작성자 본인({display})만이 댓글을 1~3개 답니다.
3. 작성자는 자신의 글에 아무도 댓글을 달지 않는 상황에 대해 혼란스러움, 짜증, 의아함을 표현해야 합니다.
   예: \"아니 왜 아무도 안 봄?\", \"서버 터짐?\", \"댓글 좀 달아줘..\", \"??\", \"내 글만 렉걸림?\"
4. 생성되는 모든 댓글의 username은 \"{display}\" 여야 하며, realIdentity는 \"{name}\"이어야 합니다."
    )
}

fn analysis_schema() -> Schema {
    let reply = Schema::object()
        .property("username", Schema::string())
        .property("realIdentity", Schema::string())
        .property("content", Schema::string())
        .property("likes", Schema::integer());

    let comment = Schema::object()
        .property("username", Schema::string())
        .property("realIdentity", Schema::string())
        .property("content", Schema::string())
        .property("likes", Schema::integer())
        .property("replies", Schema::array(reply));

    Schema::object()
        .property(
            "indices",
            Schema::object()
                .property(
                    "teacherSuspicion",
                    Schema::number().range(0.0, 100.0).describe("선생님 감시 의심도 (%)"),
                )
                .property("atmosphere", Schema::number().describe("분위기 점수"))
                .property(
                    "bullyingRisk",
                    Schema::number().range(0.0, 100.0).describe("학폭 위험도 (%)"),
                ),
        )
        .property("adminTip", Schema::string())
        .property("comments", Schema::array(comment))
}

/// Request the comment thread and board indices for `article`.
///
/// The article's current shadow-ban flag decides the instruction block.
#[must_use]
pub fn analysis_request(article: &Article, spicy: bool) -> GenerationRequest {
    let situation = if article.shadow_banned {
        shadow_ban_block(article)
    } else {
        mood(spicy).to_string()
    };

    let prompt = format!(
        "당신은 고등학교 익명 커뮤니티 댓글 시뮬레이터입니다.

[상황/분위기]
{situation}

[게시글 정보]
제목: {title}
내용: {content}
작성자(실체): {author}

[절대 규칙]
1. 모든 댓글은 위 **게시글의 내용과 100% 일치**해야 합니다. 엉뚱한 소리 금지.
2. {VOICE_RULE}
3. 쉐도우 밴 상태: {banned}. 쉐도우 밴이 적용된 경우 **작성자 외에는 아무도 댓글을 달지 못합니다.** (다른 학생 댓글 0개)
4. {NO_UNIVERSITY_RULE}
5. 각 댓글의 realIdentity에는 그 댓글을 실제로 쓴 학생의 이름을 넣으세요. 원글 작성자의 realName은 \"{name}\"입니다.

JSON 포맷으로 출력하세요.",
        title = article.title,
        content = article.content,
        author = article.author_description(),
        banned = super::yes_no(article.shadow_banned),
        name = article.real_name(),
    );

    GenerationRequest {
        operation: Operation::Analysis,
        prompt,
        schema: analysis_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_article;

    #[test]
    fn test_shadow_ban_imposes_isolation() {
        let article = sample_article().with_shadow_ban(true);
        let req = analysis_request(&article, true);
        assert_eq!(req.operation, Operation::Analysis);
        assert!(req.prompt.contains("쉐도우 밴(Shadow Ban) 적용됨"));
        assert!(req.prompt.contains("다른 학생의 댓글은 0개"));
        assert!(req.prompt.contains("혼란스러움"));
        // Isolation replaces the tone block even in spicy mode
        assert!(!req.prompt.contains("물어뜯거나"));
    }

    #[test]
    fn test_open_article_uses_mood() {
        let article = sample_article();
        assert!(analysis_request(&article, true).prompt.contains("물어뜯거나"));
        let calm = analysis_request(&article, false);
        assert!(calm.prompt.contains("장난스럽고"));
        assert!(!calm.prompt.contains("적용됨"));
        assert!(calm.prompt.contains(&article.title));
        assert!(calm.prompt.contains("2학년 7반 김민지"));
    }

    #[test]
    fn test_admin_authored_hides_identity_line() {
        let mut article = sample_article();
        article.admin_authored = true;
        let req = analysis_request(&article, false);
        assert!(req.prompt.contains("운영자(관리자)가 익명으로 작성함."));
    }

    #[test]
    fn test_schema_shape() {
        let req = analysis_request(&sample_article(), false);
        assert_eq!(req.schema.required, vec!["indices", "adminTip", "comments"]);
        let comment = req.schema.get("comments").unwrap().items.as_deref().unwrap();
        assert!(comment.get("replies").is_some());
    }
}
