//! Domain models shared by the pipeline, the REST layer and the CLI

pub mod answer;
pub mod feedback;
pub mod report;

pub use answer::{AnswerSegment, ConfidenceLevel, EvidenceItem, SectionLabel, StructuredAnswer};
pub use feedback::{DedupKey, FeedbackRecord, FeedbackStats, Form, NormalizedFeedback};
pub use report::{AnswerReport, ContextSummary, QueryScope, ScopeTarget};
