//! Prompt construction for survey questions
//!
//! The section labels written into the instructions come from
//! [`SectionLabel::ALL`], the same list the response parser scans for.

use crate::config::RetrievalConfig;
use crate::server::models::{NormalizedFeedback, SectionLabel};

/// A composed prompt plus how much of the context fit in it
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
  pub text: String,
  pub included: usize,
  pub omitted: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptComposer {
  max_entries: usize,
  max_chars: usize,
}

impl Default for PromptComposer {
  fn default() -> Self {
    Self::from_config(&RetrievalConfig::default())
  }
}

impl PromptComposer {
  pub fn new(max_entries: usize, max_chars: usize) -> Self {
    Self { max_entries, max_chars }
  }

  pub fn from_config(config: &RetrievalConfig) -> Self {
    Self::new(config.max_context_entries, config.max_context_chars)
  }

  /// Labels the instructions ask the model to use, in order
  pub fn section_labels(&self) -> Vec<&'static str> {
    SectionLabel::ALL.iter().map(|label| label.as_str()).collect()
  }

  pub fn compose(&self, question: &str, feedback: &[NormalizedFeedback]) -> String {
    self.compose_with_budget(question, feedback).text
  }

  /// Build the prompt, keeping whole entries in the given order until the
  /// entry or character budget is reached
  pub fn compose_with_budget(
    &self,
    question: &str,
    feedback: &[NormalizedFeedback],
  ) -> ComposedPrompt {
    let mut listing = String::new();
    let mut included = 0;

    for entry in feedback {
      if included >= self.max_entries {
        break;
      }
      let line = format_entry(included + 1, entry);
      if listing.len() + line.len() > self.max_chars {
        break;
      }
      listing.push_str(&line);
      included += 1;
    }

    let omitted = feedback.len() - included;
    let mut text = String::new();

    text.push_str(
      "You are an analyst answering questions about customer survey feedback. \
       Answer the question using only the feedback listed below.\n\n",
    );
    text.push_str(&format!("QUESTION: \"{}\"\n\n", question.trim()));

    text.push_str(&format!("CUSTOMER FEEDBACK ({} entries):\n", included));
    if included == 0 {
      text.push_str("(no feedback provided)\n");
    } else {
      text.push_str(&listing);
    }
    if omitted > 0 {
      text.push_str(&format!(
        "({omitted} further entries were omitted to fit the context limit; \
         account for them under DATA COVERAGE.)\n"
      ));
    }

    text.push_str(
      "\nFORMAT YOUR ANSWER WITH EXACTLY THESE SECTIONS, EACH STARTING ON ITS OWN LINE:\n",
    );
    for label in SectionLabel::ALL {
      text.push_str(&format!("{}: {}\n", label.as_str(), section_instruction(label)));
    }

    text.push_str(
      "\nGUIDELINES:\n\
       - Base every statement on the feedback above; do not invent customers, quotes or numbers.\n\
       - If the feedback is insufficient to answer, say so plainly and lower your confidence.\n\
       - Point out repeated or near-duplicate feedback instead of counting it twice.\n\
       - Quote evidence exactly, in the form \"quote\" - Name (YYYY-MM-DD).\n",
    );

    ComposedPrompt { text, included, omitted }
  }
}

fn section_instruction(label: SectionLabel) -> &'static str {
  match label {
    SectionLabel::Analysis => "a direct answer to the question with the key findings",
    SectionLabel::Evidence => {
      "one or more verbatim quotes formatted as \"quote\" - Name (YYYY-MM-DD)"
    }
    SectionLabel::DataCoverage => "how many of the entries are relevant to the question",
    SectionLabel::Confidence => "one of high, medium or low, with a short reason",
    SectionLabel::Limitations => "gaps, biases or caveats in the available feedback",
  }
}

fn format_entry(position: usize, entry: &NormalizedFeedback) -> String {
  // Keep each entry on one line so the listing stays unambiguous
  let feedback = entry.feedback.split_whitespace().collect::<Vec<_>>().join(" ");
  format!(
    "[{}] Customer: {} | Rating: {}/5 | Date: {} | Feedback: \"{}\"\n",
    position,
    entry.customer_name,
    entry.rating,
    entry.created_at.format("%Y-%m-%d"),
    feedback
  )
}
