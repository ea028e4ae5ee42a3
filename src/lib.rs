pub mod admin;
pub mod api;
pub mod booking;
pub mod client;
pub mod config_manager;
pub mod error;
pub mod reports;
pub mod survey;
pub mod utils;
pub mod view;

// Re-export the main error types for convenience
pub use error::{CounselError, CounselResult, Presentation};

pub use api::auth::{AuthError, DashboardSection, Role, SessionStore};
pub use client::AdminClient;
pub use config_manager::{AppConfig, ConfigManager};

// Re-export the booking/survey view models
pub use booking::{BookingId, BookingRecord, CountdownBoard, CountdownTicker, MemberId};
pub use survey::{CoupleSurveySnapshot, SurveyResult, SurveyType};
pub use view::{ComponentScope, LoadState, NotificationCenter};
