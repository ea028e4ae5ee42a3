//! 管理画面サービスの結合テスト

mod common;

use serde_json::json;

use common::{backend, MockTransport};
use counsel_admin::admin::{
    AccountDirectory, AccountEntry, AccountKind, AccountService, AccountStatus, CertificateQuery,
    CertificateReviewForm, CertificateService, CertificateStatus, CourseForm, CourseService,
    MembershipForm, MembershipService, NotificationFeed, PersonalityTypeForm, PersonalityTypeService,
    WithdrawalService, WithdrawalStatus,
};
use counsel_admin::api::{endpoints, HttpMethod};
use counsel_admin::{CounselError, Presentation, SurveyType};

#[tokio::test]
async fn test_certificate_review_patches_local_list() {
    let transport = MockTransport::new();
    transport.on_get(endpoints::CERTIFICATE_LIST).ok(json!({
        "list": [
            {"id": 1, "title": "Couples therapy", "counselorName": "Kim", "status": "PENDING"},
            {"id": 2, "title": "CBT", "counselorName": "Lee", "status": "PENDING"}
        ],
        "total": 2
    }));
    transport
        .on_put(endpoints::certificate_approval("2"))
        .ok(json!(null));

    let service = CertificateService::new(backend(&transport));
    let mut page = service.list(&CertificateQuery::default()).await.unwrap();
    assert_eq!(page.data.len(), 2);

    let requests = transport.requests();
    assert_eq!(requests[0].query_value("status"), Some("PENDING"));

    service
        .review(&mut page.data, "2", &CertificateReviewForm::reject("Expired document"))
        .await
        .unwrap();
    assert_eq!(page.data[0].status, CertificateStatus::Pending);
    assert_eq!(page.data[1].status, CertificateStatus::Rejected);

    let body = transport.requests()[1].body.clone().unwrap();
    assert_eq!(body, json!({"approved": false, "note": "Expired document"}));
}

#[tokio::test]
async fn test_invalid_form_is_not_sent() {
    let transport = MockTransport::new();
    let service = MembershipService::new(backend(&transport));

    let form = MembershipForm {
        name: String::new(),
        price: 10.0,
        duration_days: 30,
        description: String::new(),
        active: true,
    };
    let error = service.create(&form).await.unwrap_err();

    assert_eq!(error.presentation(), Presentation::Inline);
    let fields: Vec<String> = error.field_messages().into_iter().map(|(field, _)| field).collect();
    assert_eq!(fields, vec!["name"]);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_membership_crud() {
    let transport = MockTransport::new();
    transport
        .on_get(endpoints::MEMBERSHIP)
        .ok(json!([{"id": 1, "name": "Basic", "price": 9.5, "durationDays": 30}]));
    transport.on(HttpMethod::POST, endpoints::MEMBERSHIP).ok(
        json!({"id": 2, "name": "Premium", "price": 29.0, "durationDays": 90, "active": true}),
    );
    transport
        .on(HttpMethod::DELETE, endpoints::membership_item("1"))
        .ok(json!(null));

    let service = MembershipService::new(backend(&transport));
    let memberships = service.list().await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert!(memberships[0].active);

    let form = MembershipForm {
        name: "Premium".into(),
        price: 29.0,
        duration_days: 90,
        description: "Quarterly".into(),
        active: true,
    };
    let created = service.create(&form).await.unwrap();
    assert_eq!(created.id, "2");

    service.delete("1").await.unwrap();
    assert_eq!(transport.count(HttpMethod::DELETE, &endpoints::membership_item("1")), 1);
}

#[tokio::test]
async fn test_course_list_and_create() {
    let transport = MockTransport::new();
    transport.on_get(endpoints::COURSE_LIST).ok(json!({
        "items": [{"id": "c1", "title": "Listening", "lessonCount": 4}],
        "totalCount": 11
    }));
    transport
        .on(HttpMethod::POST, endpoints::COURSE)
        .ok(json!({"id": "c2", "title": "Conflict", "lessons": 6}));

    let service = CourseService::new(backend(&transport));
    let page = service.list(2, 5).await.unwrap();
    assert_eq!(page.total_pages, 3);
    assert!(page.has_previous && page.has_next);

    let course = service
        .create(&CourseForm {
            title: "Conflict".into(),
            description: String::new(),
            price: 0.0,
            lesson_count: 6,
            thumbnail_url: None,
        })
        .await
        .unwrap();
    assert_eq!(course.lesson_count, 6);
}

#[tokio::test]
async fn test_block_patches_only_after_success() {
    let transport = MockTransport::new();
    transport
        .on_put(endpoints::counselor_status("7"))
        .ok(json!(null));
    transport.on_put(endpoints::member_status("8")).status(503);

    let mut directory = AccountDirectory::default();
    directory.replace_all([
        AccountEntry {
            id: "7".into(),
            kind: AccountKind::Counselor,
            name: "Choi".into(),
            status: AccountStatus::Active,
        },
        AccountEntry {
            id: "8".into(),
            kind: AccountKind::Member,
            name: "Jung".into(),
            status: AccountStatus::Active,
        },
    ]);

    let service = AccountService::new(backend(&transport));
    service
        .block(&mut directory, AccountKind::Counselor, "7")
        .await
        .unwrap();
    assert_eq!(
        directory.get(AccountKind::Counselor, "7").unwrap().status,
        AccountStatus::Blocked
    );

    let error = service
        .block(&mut directory, AccountKind::Member, "8")
        .await
        .unwrap_err();
    assert!(error.is_transport());
    assert_eq!(
        directory.get(AccountKind::Member, "8").unwrap().status,
        AccountStatus::Active
    );
}

#[tokio::test]
async fn test_withdrawal_transition_is_checked_before_sending() {
    let transport = MockTransport::new();
    transport.on_get(endpoints::WITHDRAWAL_LIST).ok(json!([
        {"id": 1, "counselorName": "Han", "amount": 120.0, "status": "PENDING"},
        {"id": 2, "counselorName": "Yoon", "amount": 80.0, "status": "PAID"}
    ]));
    transport
        .on_put(endpoints::withdrawal_status("1"))
        .ok(json!(null));

    let service = WithdrawalService::new(backend(&transport));
    let mut withdrawals = service.list(None).await.unwrap();

    let error = service
        .update_status(&mut withdrawals, "2", WithdrawalStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(error, CounselError::InvalidTransition(_)));
    assert_eq!(transport.count(HttpMethod::PUT, &endpoints::withdrawal_status("2")), 0);

    service
        .update_status(&mut withdrawals, "1", WithdrawalStatus::Approved)
        .await
        .unwrap();
    assert_eq!(withdrawals[0].status, WithdrawalStatus::Approved);
    assert_eq!(
        transport.requests().last().unwrap().body,
        Some(json!({"status": "APPROVED"}))
    );
}

#[tokio::test]
async fn test_empty_notification_feed() {
    let transport = MockTransport::new();
    transport.on_get(endpoints::NOTIFICATION_LIST).status(204);

    let page = NotificationFeed::new(backend(&transport))
        .list(1, 10)
        .await
        .unwrap();
    assert!(page.data.is_empty());
    assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn test_personality_types_surface_errors() {
    let transport = MockTransport::new();
    transport
        .on_get(endpoints::PERSON_TYPE_LIST)
        .with_query("surveyId", 2)
        .ok(json!([{"id": 5, "name": "D", "surveyId": 2, "description": "Dominance"}]));
    transport
        .on_get(endpoints::PERSON_TYPE_BY_NAME)
        .with_query("name", "D")
        .ok(json!({"detail": "Direct and decisive", "strengths": ["focus"]}));
    transport
        .on_get(endpoints::PERSON_TYPE_BY_NAME)
        .with_query("name", "I")
        .status(500);
    transport
        .on_put(endpoints::person_type_item("5"))
        .ok(json!(null));

    let service = PersonalityTypeService::new(backend(&transport));
    let types = service.list(Some(SurveyType::Disc)).await.unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].survey_type(), Some(SurveyType::Disc));

    let detail = service.detail("D").await.unwrap().unwrap();
    assert_eq!(detail.long_description.as_deref(), Some("Direct and decisive"));
    assert!(service.detail("S").await.unwrap().is_none());

    let error = service.detail("I").await.unwrap_err();
    assert!(error.is_transport());

    let form = PersonalityTypeForm::from(&types[0]);
    service.update("5", &form).await.unwrap();
    assert_eq!(
        transport.requests().last().unwrap().body,
        Some(json!({"description": "Dominance", "imageUrl": null, "strengths": [], "weaknesses": []}))
    );
}
