//! 会員診断結果の取得・補足・集約の結合テスト

mod common;

use chrono::{FixedOffset, TimeZone, Utc};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use common::{backend, MockTransport};
use counsel_admin::api::{endpoints, NoDataPolicy};
use counsel_admin::survey::{history_by_date, SurveyLookupService};
use counsel_admin::{AuthError, BookingId, CounselError, MemberId, SurveyType};

fn ids() -> (MemberId, BookingId) {
    (MemberId::from("m-1"), BookingId::from("b-1"))
}

fn script_types(transport: &MockTransport) {
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 1)
        .ok(json!([
            {"result": "ISTJ", "createAt": "2024-01-05T10:00:00Z", "scores": "I:8,S:6"},
            {"result": "INTJ", "createAt": "2024-03-01T09:30:00Z", "scores": "I:9,N:7,bad,X:abc"},
            {"result": "ENTP"}
        ]));
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 2)
        .status(404);
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 3)
        .status(400);
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 4)
        .ok(json!(null));
}

#[tokio::test]
async fn test_member_results_tolerate_no_data_and_pick_latest() {
    let transport = MockTransport::new();
    script_types(&transport);
    transport
        .on_get(endpoints::PERSON_TYPE_BY_NAME)
        .with_query("name", "INTJ")
        .ok(json!({"detail": "Architect", "imageUrl": "https://cdn/intj.png"}));

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();
    let (set, report) = assert_ok!(service.fetch_member_results(&member, &booking).await);

    assert_eq!(set.total(), 3);
    assert!(set.latest(SurveyType::Disc).is_none());
    assert!(set.latest(SurveyType::LoveLanguage).is_none());
    assert!(set.latest(SurveyType::BigFive).is_none());

    let latest = set.latest(SurveyType::Mbti).unwrap();
    assert_eq!(latest.label, "INTJ");
    assert_eq!(latest.scores.len(), 2);
    assert_eq!(
        latest.detail.as_ref().unwrap().long_description.as_deref(),
        Some("Architect")
    );

    // 3件とも補足を試み、取れたのは1件
    assert_eq!(report.attempted, 3);
    assert_eq!(report.merged, 1);
    assert_eq!(report.ignored.len(), 2);

    // 4種類は並行に問い合わせる
    assert_eq!(
        transport.count(
            counsel_admin::api::HttpMethod::GET,
            endpoints::PERSON_TYPE_BEFORE_BOOKING
        ),
        4
    );
}

#[tokio::test]
async fn test_server_error_on_one_type_fails_fetch() {
    let transport = MockTransport::new();
    script_types(&transport);
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 2)
        .status(500);

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();
    let error = assert_err!(service.fetch_results(&member, &booking).await);

    assert!(error.is_transport());
    assert!(matches!(error, CounselError::Server { status: 500, .. }));
}

#[tokio::test]
async fn test_strict_policy_reports_bad_request() {
    let transport = MockTransport::new();
    script_types(&transport);

    let api = backend(&transport).with_policy(NoDataPolicy {
        bad_request_is_no_data: false,
    });
    let service = SurveyLookupService::new(api);
    let (member, booking) = ids();

    let error = assert_err!(service.fetch_results(&member, &booking).await);
    assert!(matches!(error, CounselError::Rejected { status: 400, .. }));
}

#[tokio::test]
async fn test_unauthorized_lookup_is_session_error() {
    let transport = MockTransport::new();
    script_types(&transport);
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 2)
        .status(401);

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();

    let error = assert_err!(service.fetch_results(&member, &booking).await);
    assert!(matches!(error, CounselError::Auth(AuthError::Unauthorized(_))));
    assert!(!error.is_transport());
}

#[tokio::test]
async fn test_backend_failure_envelope_is_error() {
    let transport = MockTransport::new();
    script_types(&transport);
    transport
        .on_get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
        .with_query("surveyId", 4)
        .backend_error("Member not found");

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();
    let error = assert_err!(service.fetch_results(&member, &booking).await);
    assert_eq!(error.to_string(), "Member not found");
}

#[tokio::test]
async fn test_enrichment_failure_never_fails_fetch() {
    let transport = MockTransport::new();
    script_types(&transport);
    transport
        .on_get(endpoints::PERSON_TYPE_BY_NAME)
        .fail("connection reset");

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();
    let (set, report) = assert_ok!(service.fetch_member_results(&member, &booking).await);

    assert_eq!(report.merged, 0);
    assert!(set.all().all(|result| result.detail.is_none()));
}

#[tokio::test]
async fn test_history_groups_by_display_date() {
    let transport = MockTransport::new();
    script_types(&transport);

    let service = SurveyLookupService::new(backend(&transport));
    let (member, booking) = ids();
    let set = assert_ok!(service.fetch_results(&member, &booking).await);

    // UTC+9 では 2024-03-01T09:30Z は 3/1 18:30
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    let history = history_by_date(set.all(), tokyo);
    let labels: Vec<&str> = history.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["2024/03/01", "2024/01/05", "Undated"]);

    // 日付変更線をまたぐ表示オフセット
    let late = Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap();
    let minus_eleven = FixedOffset::west_opt(11 * 3600).unwrap();
    assert_eq!(
        late.with_timezone(&minus_eleven).format("%Y/%m/%d").to_string(),
        "2024/01/04"
    );
}
