use bamboo_llm::Schema;
use bamboo_utils::error::GenerationError;

use super::{GenerationRequest, NO_UNIVERSITY_RULE, Operation};
use crate::model::{ArticleCategory, EmergencyMode, SimulationSettings};

/// Largest batch one request may ask for
pub const MAX_FEED_BATCH: u32 = 20;

const TEACHER_RAID: &str = "\
[🚨 긴급상황: 교무실의 감시 (학생부 쌤들 떴다)]
선생님들이 이 커뮤니티 보고 있다는 소문이 돌고 있음.
- \"야 쌤들이 이거 본대?\", \"망했네 글 지워라\", \"학주가 IP 딴다는데 ㄹㅇ임?\" 같은 쫄린 반응.
- 일부러 \"선생님 사랑해요^^\", \"저희는 공부를 열심히 합니다\" 같은 가식적인 글.
- 눈치 없이 \"근데 오늘 급식 뭐냐?\" 하는 글 섞기.";

const POLICE_ALERT: &str = "\
[🚨 긴급상황: 경찰 수사 (학교 뒤집어짐)]
저번 저격글 때문에 진짜 경찰차 학교에 왔다는 소문.
- \"야 아까 경찰차 본 사람?\", \"사이버수사대 접수됐대\", \"고소장 날아오냐?\" 같은 불안함.
- 서로 범인 추측하고 마피아 게임 분위기.";

const SPICY: &str = "\
[분위기: 🔥매운맛/막장 (시험기간 스트레스 폭발)]
1. 주제: 적나라한 저격(초성), 일진 놀이, 심각한 싸움, 선생님랑 싸운 썰.
2. 말투: 매우 공격적이고 비꼬는 말투. \"꼽냐?\", \"ㅋㅋ 수준 봐라\"";

const NORMAL: &str = "\
[분위기: 평범한 야자시간/쉬는시간]
1. 주제: \"아 배고파\", \"집 가고 싶다\", \"오늘 수행평가 답 뭐냐?\", \"짝남이 스토리 읽음\".
2. 수위: 귀엽고 공감 가는 고딩들의 일상.";

/// Situation block: an emergency overrides the tone, otherwise spicy picks it
fn situation(settings: SimulationSettings) -> &'static str {
    match settings.emergency {
        EmergencyMode::TeacherRaid => TEACHER_RAID,
        EmergencyMode::PoliceAlert => POLICE_ALERT,
        EmergencyMode::None if settings.spicy => SPICY,
        EmergencyMode::None => NORMAL,
    }
}

fn feed_schema() -> Schema {
    Schema::array(
        Schema::object()
            .property("title", Schema::string())
            .property("content", Schema::string())
            .property(
                "category",
                Schema::enumeration(ArticleCategory::ALL.map(ArticleCategory::label)),
            )
            .property(
                "displayAuthor",
                Schema::string().describe("보통 '익명', 'ㅇㅇ', 또는 닉네임"),
            )
            .property("realName", Schema::string().describe("실제 작성자 이름"))
            .property("studentGrade", Schema::integer().range(1.0, 3.0))
            .property("studentClass", Schema::integer().range(1.0, 12.0))
            .property(
                "likes",
                Schema::integer()
                    .range(0.0, 50.0)
                    .describe("초기 좋아요 수 (0~50)"),
            ),
    )
}

/// Request `count` new posts in the tone selected by `settings`.
///
/// # Errors
///
/// `InvalidRequest` when `count` is 0 or above [`MAX_FEED_BATCH`].
pub fn feed_request(
    count: u32,
    settings: SimulationSettings,
) -> Result<GenerationRequest, GenerationError> {
    if count == 0 || count > MAX_FEED_BATCH {
        return Err(GenerationError::InvalidRequest {
            reason: format!("feed batch must be between 1 and {MAX_FEED_BATCH}, got {count}"),
        });
    }

    let categories = ArticleCategory::ALL.map(ArticleCategory::label).join(", ");

    let prompt = format!(
        "당신은 한국 고등학교(17~19세)의 익명 커뮤니티(대나무숲) 엔진입니다.
현재 학교에서 일어날 법한 **{count}개의 다양한 익명 게시글**을 생성하세요.

[필수 말투/어조]
- 100% 리얼한 한국 고등학생 말투 사용 (07년생~09년생).
- \"~~함\", \"~~임\", \"~~냐\", \"ㄹㅇ\", \"개웃기네\", \"ㅁㅊ\", \"솔직히\" 등 자연스러운 구어체와 초성 사용.
- 너무 어른스럽거나 문어체(~~하였습니다) 절대 금지.

[주제 범위]
- 내신, 모의고사(모고), 수행평가 망함, 야자 도망, 급식 메뉴, 매점 빵.
- 짝사랑, 전남친/전여친, 고백, 썸.
- 담임쌤 뒷담, 체육대회, 축제, 친구 관계, 저격.

[절대 규칙]
- {NO_UNIVERSITY_RULE} 오직 고등학생 배경만 생각하세요.

{situation}

[데이터 생성 규칙]
1. **익명성 뒤의 실체**: 데이터에는 반드시 '실제 학생 정보(학년, 반, 이름)'가 포함되어야 합니다. (이름은 한국어 랜덤)
2. 학년: 1~3, 반: 1~12.
3. 카테고리: {categories} 중 선택.

JSON 포맷으로 출력하세요.",
        situation = situation(settings),
    );

    Ok(GenerationRequest {
        operation: Operation::Feed,
        prompt,
        schema: feed_schema(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(spicy: bool, emergency: EmergencyMode) -> SimulationSettings {
        SimulationSettings { spicy, emergency }
    }

    #[test]
    fn test_emergency_overrides_spicy() {
        let req = feed_request(4, settings(true, EmergencyMode::TeacherRaid)).unwrap();
        assert!(req.prompt.contains("교무실의 감시"));
        assert!(!req.prompt.contains("매운맛"));

        let req = feed_request(4, settings(false, EmergencyMode::PoliceAlert)).unwrap();
        assert!(req.prompt.contains("경찰 수사"));
    }

    #[test]
    fn test_spicy_selects_tone_without_emergency() {
        let spicy = feed_request(4, settings(true, EmergencyMode::None)).unwrap();
        assert!(spicy.prompt.contains("매운맛"));
        let normal = feed_request(4, settings(false, EmergencyMode::None)).unwrap();
        assert!(normal.prompt.contains("평범한 야자시간"));
    }

    #[test]
    fn test_count_and_shared_rules_in_prompt() {
        let req = feed_request(7, SimulationSettings::default()).unwrap();
        assert_eq!(req.operation, Operation::Feed);
        assert!(req.prompt.contains("7개의 다양한 익명 게시글"));
        assert!(req.prompt.contains("학번, 학과"));
        assert!(req.prompt.contains("분실물"));
    }

    #[test]
    fn test_schema_declares_identity_fields() {
        let req = feed_request(1, SimulationSettings::default()).unwrap();
        let item = req.schema.items.as_deref().unwrap();
        for field in [
            "title",
            "content",
            "category",
            "displayAuthor",
            "realName",
            "studentGrade",
            "studentClass",
            "likes",
        ] {
            assert!(item.required.iter().any(|r| r == field), "{field} missing");
        }
        assert_eq!(item.get("studentClass").unwrap().maximum, Some(12.0));
    }

    #[test]
    fn test_rejects_bad_counts() {
        assert!(feed_request(0, SimulationSettings::default()).is_err());
        assert!(feed_request(21, SimulationSettings::default()).is_err());
    }

    #[test]
    fn test_same_inputs_same_request() {
        let a = feed_request(3, settings(true, EmergencyMode::None)).unwrap();
        let b = feed_request(3, settings(true, EmergencyMode::None)).unwrap();
        assert_eq!(a, b);
    }
}
