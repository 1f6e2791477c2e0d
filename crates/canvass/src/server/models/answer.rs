//! Structured form of a generated answer

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Section headings the model is instructed to emit and the parser recognizes
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum SectionLabel {
  #[serde(rename = "ANALYSIS")]
  Analysis,
  #[serde(rename = "EVIDENCE")]
  Evidence,
  #[serde(rename = "DATA COVERAGE")]
  DataCoverage,
  #[serde(rename = "CONFIDENCE")]
  Confidence,
  #[serde(rename = "LIMITATIONS")]
  Limitations,
}

impl SectionLabel {
  /// Declared order; also the order the model is asked to answer in
  pub const ALL: [SectionLabel; 5] = [
    SectionLabel::Analysis,
    SectionLabel::Evidence,
    SectionLabel::DataCoverage,
    SectionLabel::Confidence,
    SectionLabel::Limitations,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      SectionLabel::Analysis => "ANALYSIS",
      SectionLabel::Evidence => "EVIDENCE",
      SectionLabel::DataCoverage => "DATA COVERAGE",
      SectionLabel::Confidence => "CONFIDENCE",
      SectionLabel::Limitations => "LIMITATIONS",
    }
  }

  /// Heading shown to people reading the answer
  pub fn title(self) -> &'static str {
    match self {
      SectionLabel::Analysis => "Key Findings",
      SectionLabel::Evidence => "Supporting Evidence",
      SectionLabel::DataCoverage => "Data Coverage",
      SectionLabel::Confidence => "Confidence Level",
      SectionLabel::Limitations => "Note on limitations",
    }
  }
}

impl fmt::Display for SectionLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A contiguous byte range of the raw answer; `label` is None for text
/// preceding the first recognized heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerSegment {
  pub label: Option<SectionLabel>,
  pub start: usize,
  pub end: usize,
}

impl AnswerSegment {
  pub fn range(&self) -> Range<usize> {
    self.start..self.end
  }
}

/// One quoted piece of supporting evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceItem {
  Quote { text: String, attribution: Option<String> },
  /// Stands in for an evidence section without any extractable quote
  NoEvidence { message: String },
}

pub const NO_EVIDENCE_MESSAGE: &str = "No evidence available or evidence format is incorrect.";

impl EvidenceItem {
  pub fn no_evidence() -> Self {
    EvidenceItem::NoEvidence { message: NO_EVIDENCE_MESSAGE.to_string() }
  }

  pub fn is_placeholder(&self) -> bool {
    matches!(self, EvidenceItem::NoEvidence { .. })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
  High,
  Medium,
  Low,
  Unclassified,
}

impl fmt::Display for ConfidenceLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ConfidenceLevel::High => "high",
      ConfidenceLevel::Medium => "medium",
      ConfidenceLevel::Low => "low",
      ConfidenceLevel::Unclassified => "unclassified",
    };
    f.write_str(name)
  }
}

/// Generated answer partitioned into labeled sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredAnswer {
  pub raw: String,
  /// Non-overlapping ranges whose concatenation is `raw`
  pub segments: Vec<AnswerSegment>,
  pub sections: BTreeMap<SectionLabel, String>,
  /// Text outside any recognized section, or the whole reply when no
  /// section heading was found
  pub unstructured: Option<String>,
  pub evidence: Vec<EvidenceItem>,
  pub confidence: ConfidenceLevel,
}

impl StructuredAnswer {
  pub fn section(&self, label: SectionLabel) -> Option<&str> {
    self.sections.get(&label).map(String::as_str)
  }

  pub fn has_all_sections(&self) -> bool {
    SectionLabel::ALL.iter().all(|label| self.sections.contains_key(label))
  }

  /// True when at least one recognized heading was found
  pub fn is_structured(&self) -> bool {
    !self.sections.is_empty()
  }

  /// Labels missing from the reply, in declared order
  pub fn missing_sections(&self) -> Vec<SectionLabel> {
    SectionLabel::ALL.into_iter().filter(|label| !self.sections.contains_key(label)).collect()
  }
}
