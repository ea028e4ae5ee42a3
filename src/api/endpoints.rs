//! バックエンドのエンドポイント定義

pub const BOOKING_LIST: &str = "/booking/list";
pub const PERSON_TYPE_BEFORE_BOOKING: &str = "/person-type/before-booking";
pub const PERSON_TYPE_BY_NAME: &str = "/person-type/by-name";
pub const PERSON_TYPE_LIST: &str = "/person-type/list";
pub const CERTIFICATE_LIST: &str = "/certificate/list";
pub const MEMBERSHIP: &str = "/membership";
pub const COURSE_LIST: &str = "/course/list";
pub const COURSE: &str = "/course";
pub const WITHDRAWAL_LIST: &str = "/withdrawal/list";
pub const NOTIFICATION_LIST: &str = "/notification/list";

pub fn couple_survey_by_booking(booking_id: &str) -> String {
    format!("/couple-survey/booking/{}", urlencoding::encode(booking_id))
}

pub fn report_metadata(booking_id: &str) -> String {
    format!("/booking/{}/report-metadata", urlencoding::encode(booking_id))
}

pub fn person_type_item(type_id: &str) -> String {
    format!("/person-type/{}", urlencoding::encode(type_id))
}

pub fn certificate_approval(certificate_id: &str) -> String {
    format!("/certificate/{}/approval", urlencoding::encode(certificate_id))
}

pub fn membership_item(membership_id: &str) -> String {
    format!("{}/{}", MEMBERSHIP, urlencoding::encode(membership_id))
}

pub fn counselor_status(counselor_id: &str) -> String {
    format!("/counselor/{}/status", urlencoding::encode(counselor_id))
}

pub fn member_status(member_id: &str) -> String {
    format!("/member/{}/status", urlencoding::encode(member_id))
}

pub fn withdrawal_status(withdrawal_id: &str) -> String {
    format!("/withdrawal/{}/status", urlencoding::encode(withdrawal_id))
}
