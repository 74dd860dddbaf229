use bamboo_llm::Schema;

use super::{GenerationRequest, NO_UNIVERSITY_RULE, Operation, VOICE_RULE, reply_schema, yes_no};
use crate::model::{Article, Comment};

fn identity_rule(article: &Article) -> String {
    format!(
        "쉐도우 밴 상태일 경우, 생성되는 대댓글의 username은 \"{}\" 여야 하며, realIdentity는 \"{}\"이어야 합니다.",
        article.display_author,
        article.real_name()
    )
}

/// Request the reaction to the operator's reply on `comment`.
///
/// Exactly one reply object is requested. Under shadow ban the reacting
/// identity is the article's own author whoever wrote the comment.
#[must_use]
pub fn reply_reaction_request(
    article: &Article,
    comment: &Comment,
    reply_text: &str,
    identity_revealed: bool,
) -> GenerationRequest {
    let revealed = yes_no(identity_revealed);

    let (speaker, situation) = if article.shadow_banned {
        (
            article.real_identity.to_string(),
            format!(
                "[⚠️ 특수 상황: 쉐도우 밴 상태]
게시글 작성자({name}, 표시명: {display})는 자신의 게시글이 쉐도우 밴 상태라서 아무도 못 본다고 생각하고 있었습니다.
그런데 갑자기 관리자(댓글: \"{reply_text}\")가 자신이 쓴 댓글(\"{comment}\")에 대댓글을 달았습니다.

반응 패턴:
1. **깜짝 놀람/당황**: \"어? 내 글 보여요?\", \"뭐야 알림 떴는데?\", \"누구세요?\"
2. **의심/질문**: \"님 뭐임?\", \"운영자임?\", \"왜 님만 보임?\", \"설마 쌤..?\"
3. 관리자가 신원 공개함: {revealed}

[필수: 대댓글은 **{name} 본인만** 작성해야 합니다.]",
                name = article.real_name(),
                display = article.display_author,
                comment = comment.content,
            ),
        )
    } else {
        (
            comment.real_identity.clone(),
            format!(
                "[상황]
'{username}'({identity})이 쓴 댓글(\"{comment}\")에 누군가(관리자, 댓글: \"{reply_text}\") 답글을 달았습니다.
이에 대한 자연스러운 대댓글(반응)을 1개 작성하세요.
글 내용과 이전 대화 맥락을 고려하세요.
관리자가 신원 공개함: {revealed}",
                username = comment.username,
                identity = comment.real_identity,
                comment = comment.content,
            ),
        )
    };

    let prompt = format!(
        "당신은 {speaker} 입니다.

[게시글] 제목: \"{title}\" / 내용: \"{content}\"
[내가 쓴 댓글] \"{comment}\"
[상대방(관리자)의 답글] \"{reply_text}\"

{situation}

[절대 규칙]
1. 대댓글은 위 **게시글과 이전 대화 맥락에 100% 일치**해야 합니다. 엉뚱한 소리 금지.
2. {VOICE_RULE}
3. {rule}
4. {NO_UNIVERSITY_RULE}

JSON 포맷으로 1개의 대댓글 객체를 배열에 담아 반환하세요.",
        title = article.title,
        content = article.content,
        comment = comment.content,
        rule = identity_rule(article),
    );

    GenerationRequest {
        operation: Operation::ReplyReaction,
        prompt,
        schema: Schema::array(
            reply_schema().describe("원래 댓글 작성자의 반응"),
        )
        .min_items(1)
        .max_items(1),
    }
}

/// Request reactions to a new top-level comment by the operator.
///
/// Open articles get one or two random students; a shadow-banned article
/// gets only its author.
#[must_use]
pub fn new_comment_reaction_request(
    article: &Article,
    comment: &Comment,
    identity_revealed: bool,
) -> GenerationRequest {
    let revealed = yes_no(identity_revealed);

    let situation = if article.shadow_banned {
        format!(
            "[상황: 쉐도우 밴]
게시글 작성자({name}, 표시명: {display})는 아무도 댓글을 안 달아서 우울해하고 있었습니다.
그런데 갑자기 관리자(댓글: \"{comment}\")가 자신의 게시글에 새로운 댓글을 달았습니다.

작성자의 반응을 생성하세요.
\"헐 드디어 사람 옴\", \"와 깜짝아\", \"님 제 글 보임??\" 같은 반응.
**오직 작성자 본인({name})만 반응해야 합니다.**
관리자가 신원 공개함: {revealed}",
            name = article.real_name(),
            display = article.display_author,
            comment = comment.content,
        )
    } else {
        format!(
            "[상황: 일반]
게시글에 새로운 댓글(내용: \"{comment}\", 작성자: {username})이 달렸습니다.
이에 대한 다른 학생들(랜덤 익명)의 대댓글 반응 1~2개를 생성하세요.
게시글 내용과 새 댓글 내용에 맞춰 티키타카 하세요.
관리자가 신원 공개함: {revealed}",
            comment = comment.content,
            username = comment.username,
        )
    };

    let speaker = if article.shadow_banned {
        format!("고등학생 커뮤니티 사용자({})", article.real_name())
    } else {
        "고등학생 커뮤니티 사용자".to_string()
    };

    let prompt = format!(
        "당신은 {speaker} 입니다.

[게시글] 제목: \"{title}\" / 내용: \"{content}\"
[새로 달린 댓글] \"{comment}\" (작성자: {username})

{situation}

[절대 규칙]
1. 대댓글은 위 **게시글과 새 댓글 내용에 100% 일치**해야 합니다. 엉뚱한 소리 금지.
2. {VOICE_RULE}
3. {rule}
4. {NO_UNIVERSITY_RULE}

JSON 포맷으로 대댓글 배열을 반환하세요.",
        title = article.title,
        content = article.content,
        comment = comment.content,
        username = comment.username,
        rule = identity_rule(article),
    );

    GenerationRequest {
        operation: Operation::NewCommentReaction,
        prompt,
        schema: Schema::array(reply_schema()).max_items(2),
    }
}
