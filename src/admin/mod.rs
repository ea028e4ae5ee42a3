//! 管理画面の各機能（資格証明・会員プラン・講座・アカウント・出金・お知らせ・性格タイプ）
//!
//! いずれもバックエンドへの薄いクライアントで、入力フォームは送信前に検証する。
//! 状態変更が成功したら、次の取得までの間だけ手元の一覧に反映する。

pub mod accounts;
pub mod certificates;
pub mod courses;
pub mod memberships;
pub mod notifications;
pub mod personality_types;
pub mod withdrawals;

use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::CounselResult;

pub use accounts::{AccountDirectory, AccountEntry, AccountKind, AccountService, AccountStatus};
pub use certificates::{Certificate, CertificateQuery, CertificateReviewForm, CertificateService, CertificateStatus};
pub use courses::{Course, CourseForm, CourseService};
pub use memberships::{Membership, MembershipForm, MembershipService};
pub use notifications::{unread_count, NotificationFeed, NotificationItem};
pub use personality_types::{PersonalityType, PersonalityTypeForm, PersonalityTypeService};
pub use withdrawals::{Withdrawal, WithdrawalService, WithdrawalStatus};

/// 送信前にフォームを検証する
pub(crate) fn validated<F: Validate>(form: &F) -> CounselResult<&F> {
    form.validate()?;
    Ok(form)
}

/// 文字列・数値どちらのIDも受け付ける
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Item {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let a: Item = serde_json::from_value(serde_json::json!({"id": 7})).unwrap();
        let b: Item = serde_json::from_value(serde_json::json!({"id": "c-7"})).unwrap();
        assert_eq!(a.id, "7");
        assert_eq!(b.id, "c-7");
    }
}
