//! カップル診断スナップショットの読み込み状態

mod common;

use serde_json::json;

use common::{backend, MockTransport};
use counsel_admin::api::endpoints;
use counsel_admin::survey::CoupleSurveyService;
use counsel_admin::{BookingId, LoadState, Presentation, SurveyType};

fn booking() -> BookingId {
    BookingId::from("42")
}

fn path() -> String {
    endpoints::couple_survey_by_booking("42")
}

#[tokio::test]
async fn test_all_null_snapshot_on_200_is_empty() {
    let transport = MockTransport::new();
    transport.on_get(path()).ok(json!({
        "mbti": null,
        "disc": null,
        "loveLanguage": null,
        "bigFive": null,
        "compatibilityDetail": null
    }));

    let state = CoupleSurveyService::new(backend(&transport))
        .fetch_couple_snapshot(&booking())
        .await;
    assert_eq!(state, LoadState::Empty);
}

#[tokio::test]
async fn test_not_found_is_empty() {
    let transport = MockTransport::new();
    transport.on_get(path()).status(404);

    let state = CoupleSurveyService::new(backend(&transport))
        .fetch_couple_snapshot(&booking())
        .await;
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_server_error_is_retryable_failure() {
    let transport = MockTransport::new();
    transport.on_get(path()).status(500);

    let state = CoupleSurveyService::new(backend(&transport))
        .fetch_couple_snapshot(&booking())
        .await;

    let notice = state.failure().expect("500 should fail");
    assert!(notice.retryable);
    assert_eq!(notice.presentation, Presentation::Banner);
}

#[tokio::test]
async fn test_forbidden_is_not_retryable() {
    let transport = MockTransport::new();
    transport
        .on_get(path())
        .respond(403, Some(json!({"success": false, "error": "Admins only"})));

    let state = CoupleSurveyService::new(backend(&transport))
        .fetch_couple_snapshot(&booking())
        .await;

    let notice = state.failure().expect("403 should fail");
    assert!(!notice.retryable);
    assert_eq!(notice.presentation, Presentation::Toast);
    assert_eq!(notice.message, "Admins only");
}

#[tokio::test]
async fn test_partial_snapshot_is_ready() {
    let transport = MockTransport::new();
    transport.on_get(path()).ok(json!({
        "mbti": {"member1": {"result": "INFP", "createdAt": "2024-04-01"}, "member2": {"result": "ESTJ"}},
        "disc": null,
        "compatibilityDetail": {"score": 72, "description": "Balanced", "strengths": ["listening"]}
    }));

    let state = CoupleSurveyService::new(backend(&transport))
        .fetch_couple_snapshot(&booking())
        .await;
    let snapshot = state.ready().expect("partial data is present");

    assert_eq!(snapshot.available_types(), vec![SurveyType::Mbti]);
    let pair = snapshot.pair(SurveyType::Mbti).unwrap();
    assert_eq!(pair.first.as_ref().unwrap().label, "INFP");
    assert_eq!(pair.second.as_ref().unwrap().label, "ESTJ");
    assert_eq!(snapshot.compatibility.as_ref().unwrap().score, 72);
}
