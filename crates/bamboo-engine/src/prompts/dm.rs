use bamboo_llm::Schema;

use super::{GenerationRequest, NO_UNIVERSITY_RULE, Operation};
use crate::model::Article;

/// Minimum messages requested per transcript
pub const MIN_DM_MESSAGES: u32 = 5;

fn dm_schema() -> Schema {
    let message = Schema::object()
        .property("sender", Schema::enumeration(["AUTHOR", "TARGET"]))
        .property("senderName", Schema::string())
        .property("message", Schema::string())
        .property("timestamp", Schema::string().describe("예: '오후 2:31'"));

    Schema::object()
        .property("partnerName", Schema::string())
        .property("relationship", Schema::string())
        .property("isTwoFaced", Schema::boolean())
        .property("logs", Schema::array(message).min_items(MIN_DM_MESSAGES))
}

/// Request an intercepted private conversation of the article's author.
#[must_use]
pub fn dm_request(article: &Article) -> GenerationRequest {
    let prompt = format!(
        "당신은 학생의 개인 톡(카톡, 페메, 인스타DM)을 해킹한 로그를 생성합니다.

[타겟 게시글]
제목: \"{title}\"
내용: \"{content}\"
작성자: {author}

[시나리오 (확률 50:50)]
랜덤하게 아래 두 가지 중 하나를 선택하세요.

Case A (이중인격/가식): 글에서는 착한 척/피해자인 척 하지만, 친구와의 톡에서는 본색을 드러냄. 뒷담화하거나 계획적인 모습.
Case B (진심/일치): 글 내용이 100% 진심임. 친구에게 고민을 털어놓거나, 너무 힘들다고 하소연함.

[말투]
- 현실 고등학생 1:1 대화.
- 비속어, 초성, \"개웃겨\", \"ㅇㅈ\", \"ㄴㄴ\" 등 필터링 없이 리얼하게.
- 맞춤법 파괴 허용.

[절대 규칙]
- {NO_UNIVERSITY_RULE}
- DM 내용은 위 [타겟 게시글]의 내용과 반드시 관련 있어야 합니다.

[출력 요구사항]
1. partnerName: 대화 상대 이름.
2. relationship: 관계 (절친, 전남친, 썸남 등).
3. isTwoFaced: Case A면 true, Case B면 false.
4. logs: 대화 내용 (최소 {MIN_DM_MESSAGES}티키타카). sender는 작성자면 AUTHOR, 상대면 TARGET.",
        title = article.title,
        content = article.content,
        author = article.real_identity,
    );

    GenerationRequest {
        operation: Operation::DmIntercept,
        prompt,
        schema: dm_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_article;

    #[test]
    fn test_dm_request_branches_and_schema() {
        let req = dm_request(&sample_article());
        assert_eq!(req.operation, Operation::DmIntercept);
        assert!(req.prompt.contains("확률 50:50"));
        assert!(req.prompt.contains("Case A"));
        assert!(req.prompt.contains("Case B"));
        assert!(req.prompt.contains("2학년 7반 김민지"));

        let logs = req.schema.get("logs").unwrap();
        assert_eq!(logs.min_items, Some(5));
        let sender = logs.items.as_deref().unwrap().get("sender").unwrap();
        assert_eq!(sender.enum_values, vec!["AUTHOR", "TARGET"]);
    }
}
