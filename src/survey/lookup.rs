//! 会員ごとの診断結果取得
//!
//! 4種類の診断を並行に引き、正規化・補足取得までを行う。

use futures_util::future::join_all;
use serde_json::Value;

use super::enricher::{EnrichmentReport, ResultEnricher};
use super::grouping::SurveyResultSet;
use super::normalizer::normalize_payload;
use super::types::{SurveyResult, SurveyType};
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi, LookupOutcome};
use crate::booking::{BookingId, MemberId};
use crate::CounselResult;

/// 診断結果の取得サービス
#[derive(Clone)]
pub struct SurveyLookupService {
    api: BackendApi,
    enricher: ResultEnricher,
}

impl SurveyLookupService {
    pub fn new(api: BackendApi) -> Self {
        Self {
            enricher: ResultEnricher::new(api.clone()),
            api,
        }
    }

    /// 一種類分。データなしは空ベクタ
    pub async fn fetch_type(
        &self,
        member: &MemberId,
        booking: &BookingId,
        survey_type: SurveyType,
    ) -> CounselResult<Vec<SurveyResult>> {
        let request = ApiRequest::get(endpoints::PERSON_TYPE_BEFORE_BOOKING)
            .query("memberId", member)
            .query("bookingId", booking)
            .query("surveyId", survey_type.survey_id());

        match self.api.lookup::<Value>(request).await? {
            LookupOutcome::Found(payload) => Ok(normalize_payload(survey_type, &payload)),
            LookupOutcome::NoData => Ok(Vec::new()),
        }
    }

    /// 4種類を並行に取得する（補足なし）
    ///
    /// データなしは空として扱い、通信・サーバーエラーはそのまま返す。
    pub async fn fetch_results(
        &self,
        member: &MemberId,
        booking: &BookingId,
    ) -> CounselResult<SurveyResultSet> {
        let lookups = SurveyType::ALL
            .iter()
            .map(|&survey_type| self.fetch_type(member, booking, survey_type));
        let outcomes = join_all(lookups).await;

        let mut set = SurveyResultSet::default();
        for (survey_type, outcome) in SurveyType::ALL.into_iter().zip(outcomes) {
            match outcome {
                Ok(results) => set.insert(survey_type, results),
                Err(e) => {
                    tracing::error!(
                        %member,
                        %booking,
                        %survey_type,
                        "❌ Survey lookup failed: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            %member,
            %booking,
            results = set.total(),
            "📋 Survey results loaded"
        );
        Ok(set)
    }

    /// 取得と補足情報の付与
    pub async fn fetch_member_results(
        &self,
        member: &MemberId,
        booking: &BookingId,
    ) -> CounselResult<(SurveyResultSet, EnrichmentReport)> {
        let mut set = self.fetch_results(member, booking).await?;

        let mut flat: Vec<SurveyResult> = set.all().cloned().collect();
        let report = self.enricher.enrich_all(&mut flat).await;

        // 並びは by_type と同じなので順に戻す
        for (slot, enriched) in set.results_mut().zip(flat) {
            *slot = enriched;
        }

        tracing::debug!(
            attempted = report.attempted,
            merged = report.merged,
            ignored = report.ignored.len(),
            "✨ Enrichment finished"
        );
        Ok((set, report))
    }
}
