//! カウンセラーの出金申請

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::deserialize_id;
use crate::api::endpoints;
use crate::api::{ApiRequest, BackendApi};
use crate::{CounselError, CounselResult};

/// 出金申請の状態
///
/// 申請中 → 承認 → 支払済、または 申請中／承認 → 却下。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl WithdrawalStatus {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Paid => "PAID",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Paid)
                | (Self::Approved, Self::Rejected)
        )
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Rejected | Self::Paid)
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, alias = "counselor")]
    pub counselor_name: String,
    pub amount: f64,
    #[serde(default)]
    pub bank_account: Option<String>,
    pub status: WithdrawalStatus,
    #[serde(default, alias = "createdAt")]
    pub requested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: WithdrawalStatus,
}

#[derive(Clone)]
pub struct WithdrawalService {
    api: BackendApi,
}

impl WithdrawalService {
    pub fn new(api: BackendApi) -> Self {
        Self { api }
    }

    pub async fn list(&self, status: Option<WithdrawalStatus>) -> CounselResult<Vec<Withdrawal>> {
        let request = ApiRequest::get(endpoints::WITHDRAWAL_LIST)
            .query_opt("status", status.map(|s| s.as_api_str()));
        let withdrawals: Option<Vec<Withdrawal>> = self.api.lookup(request).await?.into_option();
        Ok(withdrawals.unwrap_or_default())
    }

    /// 状態を進める。許可されない遷移は送信せずに拒否する
    pub async fn update_status(
        &self,
        withdrawals: &mut [Withdrawal],
        withdrawal_id: &str,
        next: WithdrawalStatus,
    ) -> CounselResult<()> {
        if let Some(current) = withdrawals.iter().find(|w| w.id == withdrawal_id) {
            if !current.status.can_transition_to(next) {
                return Err(CounselError::InvalidTransition(format!(
                    "withdrawal {} cannot move from {} to {}",
                    withdrawal_id, current.status, next
                )));
            }
        }

        let request = ApiRequest::put(endpoints::withdrawal_status(withdrawal_id))
            .json(&StatusBody { status: next })?;
        self.api.dispatch(request).await?;
        tracing::info!(withdrawal = withdrawal_id, status = %next, "💸 Withdrawal status updated");

        if let Some(withdrawal) = withdrawals.iter_mut().find(|w| w.id == withdrawal_id) {
            withdrawal.status = next;
        }
        Ok(())
    }
}
