//! Splits a generated reply into labeled sections
//!
//! A label token is one of the [`SectionLabel`] headings, starting at a word
//! boundary and immediately followed by `:`. Replies that ignore the format
//! degrade to an answer whose `unstructured` section holds the whole text.
//! Any other heading is plain text and stays in the section it appears in.

use regex::Regex;
use std::collections::BTreeMap;

use crate::server::models::{
  AnswerSegment, ConfidenceLevel, EvidenceItem, SectionLabel, StructuredAnswer,
};

const EVIDENCE_PATTERN: &str = r#""(.*?)"\s*-?\s*([\p{L}\p{N} ]*(?:\(\d{4}-\d{2}-\d{2}\))?)"#;

/// A label heading found in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelToken {
  pub label: SectionLabel,
  /// Byte offset of the first character of the label
  pub start: usize,
  /// Byte offset just past the colon
  pub body_start: usize,
}

pub struct ResponseParser {
  evidence_pattern: Regex,
}

impl Default for ResponseParser {
  fn default() -> Self {
    Self::new()
  }
}

impl ResponseParser {
  pub fn new() -> Self {
    Self { evidence_pattern: Regex::new(EVIDENCE_PATTERN).expect("evidence pattern is valid") }
  }

  pub fn recognized_labels() -> Vec<&'static str> {
    SectionLabel::ALL.iter().map(|label| label.as_str()).collect()
  }

  pub fn parse(&self, raw: &str) -> StructuredAnswer {
    let tokens = scan_labels(raw);
    let segments = build_segments(raw, &tokens);

    let mut sections: BTreeMap<SectionLabel, String> = BTreeMap::new();
    let mut unstructured = None;

    if tokens.is_empty() {
      if !raw.trim().is_empty() {
        unstructured = Some(raw.to_string());
      }
    } else {
      let preamble = &raw[..tokens[0].start];
      if !preamble.trim().is_empty() {
        unstructured = Some(clean_body(preamble).to_string());
      }

      for (token, segment) in tokens.iter().zip(segments.iter().filter(|s| s.label.is_some())) {
        let body = clean_body(&raw[token.body_start..segment.end]);
        sections
          .entry(token.label)
          .and_modify(|existing| {
            if !body.is_empty() {
              if !existing.is_empty() {
                existing.push_str("\n\n");
              }
              existing.push_str(body);
            }
          })
          .or_insert_with(|| body.to_string());
      }
    }

    let evidence = self.extract_evidence(sections.get(&SectionLabel::Evidence).map(String::as_str));
    let confidence = sections
      .get(&SectionLabel::Confidence)
      .map(|body| classify_confidence(body))
      .unwrap_or(ConfidenceLevel::Unclassified);

    if unstructured.is_some() && sections.is_empty() {
      tracing::debug!("reply contained no recognized section labels");
    }

    StructuredAnswer {
      raw: raw.to_string(),
      segments,
      sections,
      unstructured,
      evidence,
      confidence,
    }
  }

  /// Quotes with optional attribution; a single placeholder when none match
  pub fn extract_evidence(&self, body: Option<&str>) -> Vec<EvidenceItem> {
    let Some(body) = body else {
      return vec![EvidenceItem::no_evidence()];
    };

    let decoded = normalize_quotes(body);
    let items: Vec<EvidenceItem> = self
      .evidence_pattern
      .captures_iter(&decoded)
      .filter_map(|captures| {
        let text = captures.get(1)?.as_str().trim();
        if text.is_empty() {
          return None;
        }
        let attribution = captures
          .get(2)
          .map(|m| m.as_str().trim())
          .filter(|a| !a.is_empty())
          .map(str::to_string);
        Some(EvidenceItem::Quote { text: text.to_string(), attribution })
      })
      .collect();

    if items.is_empty() {
      vec![EvidenceItem::no_evidence()]
    } else {
      items
    }
  }
}

/// Find every label token in reading order
pub fn scan_labels(raw: &str) -> Vec<LabelToken> {
  let mut tokens = Vec::new();
  let mut previous: Option<char> = None;

  for (offset, ch) in raw.char_indices() {
    let at_boundary = previous.map_or(true, |p| !is_word_char(p));
    previous = Some(ch);

    if !at_boundary || !ch.is_ascii_uppercase() {
      continue;
    }

    let rest = &raw[offset..];
    for label in SectionLabel::ALL {
      let name = label.as_str();
      if rest.starts_with(name) && rest[name.len()..].starts_with(':') {
        tokens.push(LabelToken { label, start: offset, body_start: offset + name.len() + 1 });
        break;
      }
    }
  }

  tokens
}

/// Partition `raw` at each token; the segments cover `raw` exactly
fn build_segments(raw: &str, tokens: &[LabelToken]) -> Vec<AnswerSegment> {
  let mut segments = Vec::with_capacity(tokens.len() + 1);

  let first_start = tokens.first().map_or(raw.len(), |t| t.start);
  if first_start > 0 {
    segments.push(AnswerSegment { label: None, start: 0, end: first_start });
  }

  for (i, token) in tokens.iter().enumerate() {
    let end = tokens.get(i + 1).map_or(raw.len(), |next| next.start);
    segments.push(AnswerSegment { label: Some(token.label), start: token.start, end });
  }

  segments
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_'
}

/// Trim whitespace and markdown emphasis or heading markers around a body
fn clean_body(body: &str) -> &str {
  body
    .trim()
    .trim_start_matches('*')
    .trim_end_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
    .trim()
}

fn normalize_quotes(text: &str) -> String {
  text.replace("&quot;", "\"").replace(['\u{201C}', '\u{201D}'], "\"")
}

pub fn classify_confidence(body: &str) -> ConfidenceLevel {
  let level = body.chars().filter(|c| *c != '#' && *c != '*').collect::<String>().to_lowercase();

  if level.contains("high") {
    ConfidenceLevel::High
  } else if level.contains("medium") {
    ConfidenceLevel::Medium
  } else if level.contains("low") {
    ConfidenceLevel::Low
  } else {
    ConfidenceLevel::Unclassified
  }
}
