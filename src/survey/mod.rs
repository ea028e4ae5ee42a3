//! 診断結果の取得・正規化・集約

pub mod couple;
pub mod enricher;
pub mod grouping;
pub mod lookup;
pub mod normalizer;
pub mod types;

pub use couple::{CompatibilityRecord, CoupleSurveyService, CoupleSurveySnapshot, MemberPair};
pub use enricher::{merge_best_effort, BestEffort, EnrichmentReport, Ignored, ResultEnricher};
pub use grouping::{history_by_date, latest, score_bars, DateBucket, ResultPanel, ScoreBar, SurveyResultSet};
pub use lookup::SurveyLookupService;
pub use normalizer::{normalize_entry, normalize_payload, parse_score_string, parse_scores};
pub use types::{PersonalityDetail, ScoreMap, SurveyResult, SurveyType};
