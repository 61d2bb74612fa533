mod analyzer;
mod error;
mod language;
mod report;
mod request;

pub use analyzer::{ChangeAnalyzer, DEFAULT_MIN_CODE_CHANGE_BYTES};
pub use error::AnalysisError;
pub use language::{detect_language, is_excluded, EXCLUDED_SUFFIXES};
pub use report::{ChangeReport, FileAnalysis};
pub use request::ChangeRequest;
