//! 予約データ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::survey::normalizer::parse_timestamp;

/// 予約ID
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display, derive_more::From,
)]
pub struct BookingId(pub String);

impl BookingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookingId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 会員ID
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display, derive_more::From,
)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// 予約ステータス
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Confirmed,
    Finished,
    Rescheduled,
    CancelledByMember,
    CancelledByCounselor,
    Cancelled,
    Refunded,
    Completed,
    Unknown(String),
}

impl BookingStatus {
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "confirmed" | "confirm" => Self::Confirmed,
            "finished" | "finish" => Self::Finished,
            "rescheduled" | "reschedule" => Self::Rescheduled,
            "cancelledbymember" | "canceledbymember" | "membercancelled" => {
                Self::CancelledByMember
            }
            "cancelledbycounselor" | "canceledbycounselor" | "counselorcancelled" => {
                Self::CancelledByCounselor
            }
            "cancelled" | "canceled" => Self::Cancelled,
            "refunded" | "refund" => Self::Refunded,
            "completed" | "complete" => Self::Completed,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_api_str(&self) -> &str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Finished => "FINISHED",
            Self::Rescheduled => "RESCHEDULED",
            Self::CancelledByMember => "CANCELLED_BY_MEMBER",
            Self::CancelledByCounselor => "CANCELLED_BY_COUNSELOR",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::Completed => "COMPLETED",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::CancelledByMember | Self::CancelledByCounselor
        )
    }

    /// レビュー期限のカウントダウン対象か
    pub fn has_review_countdown(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<BookingStatus> for String {
    fn from(value: BookingStatus) -> Self {
        value.as_api_str().to_string()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// 予約の参加者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingMember {
    pub id: MemberId,
    pub name: String,
}

/// 予約（バックエンドの読み取り専用射影）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    /// 一人または二人
    pub members: Vec<BookingMember>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub categories: Vec<String>,
    pub rating: Option<f32>,
}

impl BookingRecord {
    pub fn first_member(&self) -> Option<&BookingMember> {
        self.members.first()
    }

    pub fn second_member(&self) -> Option<&BookingMember> {
        self.members.get(1)
    }

    pub fn is_couple(&self) -> bool {
        self.members.len() >= 2
    }

    /// 生データから組み立てる。必須項目が欠けていれば `None`
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let get = |keys: &[&str]| keys.iter().filter_map(|k| map.get(*k)).find(|v| !v.is_null());

        let id = get(&["id", "bookingId"]).and_then(id_string)?;
        let start_time = get(&["startTime", "start", "startAt"]).and_then(parse_timestamp)?;
        let end_time = get(&["endTime", "end", "endAt"]).and_then(parse_timestamp)?;
        let status = get(&["status", "bookingStatus"])
            .and_then(Value::as_str)
            .map(BookingStatus::parse)
            .unwrap_or_else(|| BookingStatus::Unknown(String::new()));

        let mut members = Vec::new();
        if let Some(Value::Array(items)) = get(&["members"]) {
            members.extend(items.iter().filter_map(member_of));
        } else {
            for key in ["member", "member1", "member2"] {
                if let Some(member) = map.get(key).and_then(member_of) {
                    members.push(member);
                }
            }
        }
        members.truncate(2);

        let categories = match get(&["categories", "tags", "category"]) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().or_else(|| v.get("name").and_then(Value::as_str)))
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        };

        let rating = get(&["rating", "rate"])
            .and_then(Value::as_f64)
            .map(|r| r as f32);

        Some(Self {
            id: BookingId(id),
            members,
            start_time,
            end_time,
            status,
            categories,
            rating,
        })
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn member_of(value: &Value) -> Option<BookingMember> {
    let map = value.as_object()?;
    let id = ["id", "memberId", "userId"]
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(id_string)?;
    let name = ["name", "fullName", "nickname"]
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    Some(BookingMember {
        id: MemberId(id),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_variants() {
        assert_eq!(BookingStatus::parse("FINISHED"), BookingStatus::Finished);
        assert_eq!(
            BookingStatus::parse("cancelled_by_member"),
            BookingStatus::CancelledByMember
        );
        assert_eq!(BookingStatus::parse("Canceled"), BookingStatus::Cancelled);
        assert_eq!(
            BookingStatus::parse("ON_HOLD"),
            BookingStatus::Unknown("ON_HOLD".into())
        );
        assert!(BookingStatus::CancelledByCounselor.is_cancelled());
        assert!(BookingStatus::Finished.has_review_countdown());
        assert!(!BookingStatus::Completed.has_review_countdown());
    }

    #[test]
    fn test_status_serde_uses_api_strings() {
        let status: BookingStatus = serde_json::from_value(json!("refunded")).unwrap();
        assert_eq!(status, BookingStatus::Refunded);
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("REFUNDED"));
    }

    #[test]
    fn test_booking_from_value() {
        let booking = BookingRecord::from_value(&json!({
            "id": 12,
            "member1": {"id": 1, "name": "Aki"},
            "member2": {"memberId": "2", "fullName": "Ren"},
            "startTime": "2024-03-01T10:00:00Z",
            "endTime": "2024-03-01T11:00:00Z",
            "status": "FINISHED",
            "tags": [{"name": "couple"}, "premarital"],
            "rating": 4.5
        }))
        .unwrap();

        assert_eq!(booking.id.as_str(), "12");
        assert!(booking.is_couple());
        assert_eq!(booking.second_member().unwrap().name, "Ren");
        assert_eq!(booking.categories, vec!["couple", "premarital"]);
        assert_eq!(booking.rating, Some(4.5));
    }

    #[test]
    fn test_booking_requires_time_window() {
        assert!(BookingRecord::from_value(&json!({"id": "x", "startTime": "2024-01-01"})).is_none());
        assert!(BookingRecord::from_value(&json!("x")).is_none());
    }
}
