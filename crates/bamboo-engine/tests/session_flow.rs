//! End-to-end session flows against a scripted generation backend

use std::sync::Arc;
use std::time::Duration;

use bamboo_engine::{
    AnalysisState, ContentGenerator, DmIntercept, Feed, FALLBACK_COMMENT, GenerationError,
    InterceptState, PostSession, ReactionOutcome,
};
use bamboo_llm::{LlmError, RetryPolicy, ScriptedBackend};
use serde_json::{Value, json};

fn generator(backend: &Arc<ScriptedBackend>) -> ContentGenerator {
    ContentGenerator::new(
        backend.clone(),
        RetryPolicy::new(2, Duration::from_millis(5)),
        "scripted",
        Duration::from_secs(5),
    )
}

fn feed_batch() -> Value {
    json!([{
        "title": "체육대회 반티 투표",
        "content": "우리반 반티 진짜 별로임",
        "category": "뒷담화",
        "displayAuthor": "ㅇㅇ",
        "realName": "최유나",
        "studentGrade": 2,
        "studentClass": 5,
        "likes": 7
    }])
}

fn open_analysis() -> Value {
    json!({
        "indices": {"teacherSuspicion": 20, "atmosphere": 60, "bullyingRisk": 15},
        "adminTip": "반티 얘기로 싸움 날 수도",
        "comments": [
            {"username": "ㅋㅋ", "realIdentity": "박서준", "content": "ㄹㅇ 누가 골랐냐", "likes": 3, "replies": []},
            {"username": "익명", "realIdentity": "정다은", "content": "난 괜찮던데", "likes": 1, "replies": []}
        ]
    })
}

fn banned_analysis_ignoring_instructions() -> Value {
    json!({
        "indices": {"teacherSuspicion": 5, "atmosphere": 10, "bullyingRisk": 0},
        "adminTip": "아무도 못 봄",
        "comments": [
            {"username": "ㅋㅋ", "realIdentity": "박서준", "content": "나 보이는데?", "likes": 0, "replies": []}
        ]
    })
}

async fn opened_session(backend: &Arc<ScriptedBackend>) -> PostSession {
    backend.push_response(feed_batch().to_string());
    backend.push_response(open_analysis().to_string());

    let generator = generator(backend);
    let mut feed = Feed::new(Default::default(), 1);
    assert_eq!(feed.load_more(&generator).await.unwrap(), 1);

    let mut session = PostSession::new(feed.articles()[0].clone(), feed.settings());
    session.analyze(&generator).await.unwrap();
    session
}

#[tokio::test]
async fn test_toggle_twice_replaces_thread_wholesale() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut session = opened_session(&backend).await;
    assert_eq!(session.state(), AnalysisState::Ready);
    assert_eq!(session.comments().len(), 2);

    let generator = generator(&backend);
    backend.push_response(banned_analysis_ignoring_instructions().to_string());
    session.toggle_and_reanalyze(&generator).await.unwrap();
    assert!(session.article().shadow_banned);
    assert_eq!(session.comments().len(), 1);
    assert_eq!(session.comments()[0].content, FALLBACK_COMMENT);
    assert_eq!(session.comments()[0].real_identity, "최유나");

    backend.push_response(open_analysis().to_string());
    session.toggle_and_reanalyze(&generator).await.unwrap();
    assert!(!session.article().shadow_banned);
    let authors: Vec<_> = session
        .comments()
        .iter()
        .map(|c| c.real_identity.as_str())
        .collect();
    assert_eq!(authors, ["박서준", "정다은"]);
    assert_eq!(session.epoch(), 3);
}

#[tokio::test]
async fn test_comment_survives_reaction_failure() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut session = opened_session(&backend).await;
    let generator = generator(&backend);

    backend.push_failure(LlmError::ProviderOutage("503".to_string()));
    let err = session
        .comment(&generator, "반티 다시 투표합시다")
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Backend { .. }));

    let posted = session.comments().last().unwrap();
    assert_eq!(posted.content, "반티 다시 투표합시다");
    assert!(posted.is_moderator());
    assert!(posted.replies.is_empty());
}

#[tokio::test]
async fn test_reply_reaction_appended_to_target() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut session = opened_session(&backend).await;
    let generator = generator(&backend);
    session.set_identity_revealed(true);

    let target = session.comments()[1].id.clone();
    backend.push_response(
        json!([{"username": "익명", "realIdentity": "정다은", "content": "헐 운영자님?", "likes": 0}])
            .to_string(),
    );
    let outcome = session.reply(&generator, &target, "진심이냐").await.unwrap();
    assert_eq!(outcome, ReactionOutcome::Applied(1));

    let thread = session.find_comment(&target).unwrap();
    assert_eq!(thread.replies.len(), 2);
    assert_eq!(thread.replies[0].username, "👑운영자");
    assert_eq!(thread.replies[1].content, "헐 운영자님?");
    assert!(session.comments()[0].replies.is_empty());

    let prompt = backend.invocations().last().unwrap().prompt_text();
    assert!(prompt.contains("관리자가 신원 공개함: 네"));
}

#[tokio::test]
async fn test_reaction_to_replaced_thread_is_dropped() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut session = opened_session(&backend).await;
    let generator = generator(&backend);

    let target = session.comments()[0].id.clone();
    let pending = session.reply_to(&target, "누가 골랐는지 말해봐").unwrap();

    backend.push_response(banned_analysis_ignoring_instructions().to_string());
    session.toggle_and_reanalyze(&generator).await.unwrap();

    backend.push_response(
        json!([{"username": "ㅋㅋ", "realIdentity": "박서준", "content": "나 아님", "likes": 0}])
            .to_string(),
    );
    let replies = pending.generate(&generator).await.unwrap();
    assert_eq!(
        session.apply_reaction(&pending, replies),
        ReactionOutcome::StaleEpoch
    );
    assert!(session.comments().iter().all(|c| c.replies.is_empty()));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_reanalysis_keeps_previous_thread() {
    let backend = Arc::new(ScriptedBackend::new());
    let mut session = opened_session(&backend).await;
    let generator = generator(&backend);

    for _ in 0..3 {
        backend.push_failure(LlmError::ProviderQuota("429 Too Many Requests".to_string()));
    }
    let err = session.toggle_and_reanalyze(&generator).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert!(matches!(err, GenerationError::RateLimited { attempts: 3, .. }));

    assert_eq!(session.state(), AnalysisState::Ready);
    assert!(!session.article().shadow_banned);
    assert_eq!(session.comments().len(), 2);
    assert!(session.last_error().is_some());
}

#[tokio::test]
async fn test_intercept_flow() {
    let backend = Arc::new(ScriptedBackend::new());
    let session = opened_session(&backend).await;
    let generator = generator(&backend);

    backend.push_response(
        json!({
            "partnerName": "박서준",
            "relationship": "절친",
            "isTwoFaced": true,
            "logs": [
                {"sender": "AUTHOR", "senderName": "최유나", "message": "글 봤냐 ㅋㅋ", "timestamp": "오후 9:01"},
                {"sender": "TARGET", "senderName": "박서준", "message": "ㅇㅇ 니가 씀?", "timestamp": "오후 9:02"},
                {"sender": "AUTHOR", "senderName": "최유나", "message": "ㅅㅂ 비밀", "timestamp": "오후 9:02"},
                {"sender": "TARGET", "senderName": "박서준", "message": "ㅋㅋㅋ", "timestamp": "오후 9:03"},
                {"sender": "AUTHOR", "senderName": "최유나", "message": "반장 빡치라고 쓴거임", "timestamp": "오후 9:03"}
            ]
        })
        .to_string(),
    );
    let mut intercept = DmIntercept::new(session.article().clone());
    let transcript = intercept.run(&generator).await.unwrap();
    assert!(transcript.two_faced);
    assert_eq!(transcript.messages.len(), 5);
    assert!(matches!(intercept.state(), InterceptState::Loaded(_)));
}
