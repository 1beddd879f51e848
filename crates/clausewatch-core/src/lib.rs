pub mod catalog;
pub mod clause;
pub mod detector;
pub mod estimate;
pub mod record;

pub use catalog::{CATALOG, RiskPattern, Severity};
pub use clause::{Clause, split_clauses};
pub use detector::{ClauseRule, FlaggedClause, PatternMatch, detect, detect_all, flag_clauses};
pub use estimate::{Estimator, format_inr, to_inr};
pub use record::{AnalysisResponse, ErrorResponse, RecordStatus, RiskRecord, Source};
