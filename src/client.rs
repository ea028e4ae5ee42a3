//! 管理クライアント
//!
//! 設定とセッションからトランスポートを組み立て、各機能のサービスを配る。

use chrono::FixedOffset;
use std::sync::Arc;

use crate::admin::{
    AccountService, CertificateService, CourseService, MembershipService, NotificationFeed,
    PersonalityTypeService, WithdrawalService,
};
use crate::api::auth::{DashboardSection, SessionStore, TokenClaims};
use crate::api::http_transport::ApiMetricsSnapshot;
use crate::api::{ApiTransport, BackendApi, HttpTransport};
use crate::booking::{BookingService, TickerConfig};
use crate::config_manager::AppConfig;
use crate::reports::ReportDispatcher;
use crate::survey::{CoupleSurveyService, SurveyLookupService};
use crate::view::NotificationCenter;
use crate::CounselResult;

pub struct AdminClient {
    api: BackendApi,
    session: SessionStore,
    notifications: NotificationCenter,
    reports: ReportDispatcher,
    http: Option<Arc<HttpTransport>>,
    display_offset: FixedOffset,
    ticker: TickerConfig,
    page_size: u32,
}

impl AdminClient {
    /// reqwestトランスポートで接続する
    pub fn connect(config: &AppConfig, session: SessionStore) -> CounselResult<Self> {
        let http = Arc::new(HttpTransport::new(config.client_config(), session.clone())?);
        let mut client = Self::with_transport(http.clone(), session, config);
        client.http = Some(http);

        tracing::info!(base_url = %config.api.base_url, "🔌 Admin client ready");
        Ok(client)
    }

    /// 任意のトランスポートで組み立てる
    pub fn with_transport(
        transport: Arc<dyn ApiTransport>,
        session: SessionStore,
        config: &AppConfig,
    ) -> Self {
        let api = BackendApi::new(transport).with_policy(config.api.no_data);
        let notifications = NotificationCenter::default();
        Self {
            reports: ReportDispatcher::new(api.clone(), notifications.clone()),
            api,
            session,
            notifications,
            http: None,
            display_offset: config.display_offset(),
            ticker: config.ticker_config(),
            page_size: config.display.page_size,
        }
    }

    /// ログイン中のロールでその画面を開けるか確認する
    pub fn require(&self, section: DashboardSection) -> CounselResult<TokenClaims> {
        let claims = self.session.claims()?;
        claims.role.require(section)?;
        Ok(claims)
    }

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    pub fn ticker_config(&self) -> TickerConfig {
        self.ticker.clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// HTTPトランスポート使用時のみ
    pub fn metrics(&self) -> Option<ApiMetricsSnapshot> {
        self.http.as_ref().map(|http| http.metrics())
    }

    pub fn bookings(&self) -> BookingService {
        BookingService::new(self.api.clone())
    }

    pub fn surveys(&self) -> SurveyLookupService {
        SurveyLookupService::new(self.api.clone())
    }

    pub fn couple_surveys(&self) -> CoupleSurveyService {
        CoupleSurveyService::new(self.api.clone())
    }

    /// 送信中フラグはクライアント全体で共有
    pub fn reports(&self) -> &ReportDispatcher {
        &self.reports
    }

    pub fn certificates(&self) -> CertificateService {
        CertificateService::new(self.api.clone())
    }

    pub fn memberships(&self) -> MembershipService {
        MembershipService::new(self.api.clone())
    }

    pub fn courses(&self) -> CourseService {
        CourseService::new(self.api.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.api.clone())
    }

    pub fn withdrawals(&self) -> WithdrawalService {
        WithdrawalService::new(self.api.clone())
    }

    pub fn notification_feed(&self) -> NotificationFeed {
        NotificationFeed::new(self.api.clone())
    }

    pub fn personality_types(&self) -> PersonalityTypeService {
        PersonalityTypeService::new(self.api.clone())
    }
}
