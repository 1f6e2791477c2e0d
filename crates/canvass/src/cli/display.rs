//! Display formatting utilities for CLI output

use colored::*;

use bentley::daemon_logs::{LogEntry, LogLevel};

use crate::server::models::{
  ConfidenceLevel, EvidenceItem, FeedbackRecord, FeedbackStats, SectionLabel, StructuredAnswer,
};
use crate::server::types::{AskResponse, FormDetailsResponse, StatusResponse};

const WIDTH: usize = 88;
const INDENT: &str = "  ";

/// Word-wrap `text` to `width` columns, keeping blank lines between paragraphs
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.lines() {
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
      if !current.is_empty() && current.len() + 1 + word.len() > width {
        lines.push(std::mem::take(&mut current));
      }
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(word);
    }
    lines.push(current);
  }

  lines
}

fn push_block(out: &mut String, text: &str) {
  for line in wrap_text(text, WIDTH - INDENT.len()) {
    if line.is_empty() {
      out.push('\n');
    } else {
      out.push_str(&format!("{INDENT}{line}\n"));
    }
  }
}

fn heading(label: SectionLabel) -> ColoredString {
  label.title().bold().underline()
}

pub fn confidence_badge(level: ConfidenceLevel, text: &str) -> ColoredString {
  let badge = format!(" {} ", text.replace(['#', '*'], "").trim());
  match level {
    ConfidenceLevel::High => badge.black().on_green(),
    ConfidenceLevel::Medium => badge.black().on_yellow(),
    ConfidenceLevel::Low => badge.white().on_red(),
    ConfidenceLevel::Unclassified => badge.black().on_white(),
  }
}

pub fn format_evidence(items: &[EvidenceItem]) -> String {
  let mut out = String::new();
  for item in items {
    match item {
      EvidenceItem::Quote { text, attribution } => {
        let author = attribution.as_deref().unwrap_or("Unknown Author");
        out.push_str(&format!("{INDENT}{} {}\n", "❝".blue(), format!("\"{text}\"").bold()));
        out.push_str(&format!("{INDENT}    {}\n", format!("- {author}").dimmed()));
      }
      EvidenceItem::NoEvidence { message } => {
        out.push_str(&format!("{INDENT}{}\n", message.dimmed()));
      }
    }
  }
  out
}

pub fn format_stats(stats: &FeedbackStats) -> String {
  format!(
    "{} responses · average rating {}/5 · {} customers",
    stats.total_feedbacks.to_string().cyan(),
    format!("{:.1}", stats.average_rating).cyan(),
    stats.unique_customers.to_string().cyan()
  )
}

/// Render an answer section by section in reading order
pub fn format_answer(answer: &StructuredAnswer) -> String {
  let mut out = String::new();

  if let Some(text) = &answer.unstructured {
    push_block(&mut out, text);
    out.push('\n');
  }

  for label in SectionLabel::ALL {
    let Some(body) = answer.section(label) else {
      continue;
    };

    match label {
      SectionLabel::Analysis | SectionLabel::DataCoverage => {
        out.push_str(&format!("{}\n", heading(label)));
        push_block(&mut out, body);
        out.push('\n');
      }
      SectionLabel::Evidence => {
        out.push_str(&format!("{}\n", heading(label)));
        out.push_str(&format_evidence(&answer.evidence));
        out.push('\n');
      }
      SectionLabel::Confidence => {
        out.push_str(&format!(
          "{}: {}\n\n",
          label.title().bold(),
          confidence_badge(answer.confidence, body)
        ));
      }
      SectionLabel::Limitations => {
        out.push_str(&format!("{} {}\n\n", format!("{}:", label.title()).italic(), body.italic()));
      }
    }
  }

  out
}

pub fn display_ask_response(response: &AskResponse) {
  print!("{}", format_answer(&response.answer));
  println!("{}", "─".repeat(WIDTH).dimmed());
  println!("{}", format_stats(&response.feedback_stats));
  if response.context.omitted > 0 {
    println!(
      "{}",
      format!(
        "{} of {} entries fit in the model context",
        response.context.included,
        response.context.included + response.context.omitted
      )
      .dimmed()
    );
  }
}

fn format_feedback_line(record: &FeedbackRecord) -> String {
  let rating = usize::from(record.rating);
  format!(
    "{} {} {} {}",
    record.created_at.format("%Y-%m-%d").to_string().dimmed(),
    format!("{}{}", "★".repeat(rating), "☆".repeat(5usize.saturating_sub(rating))).yellow(),
    record.customer_name.cyan(),
    record.feedback
  )
}

pub fn display_form(details: &FormDetailsResponse) {
  println!("{} ({})", details.form.title.bold(), details.form.form_url_id.dimmed());
  println!("{}\n", format_stats(&details.feedback_stats));

  if details.feedback.is_empty() {
    println!("No feedback submitted yet.");
    return;
  }
  for record in &details.feedback {
    println!("{INDENT}{}", format_feedback_line(record));
  }
}

pub fn display_status(base_url: &str, status: &StatusResponse) {
  println!("{} {} at {}", "●".green(), status.status.bold(), base_url.cyan());
  println!("{INDENT}version:    {}", status.version);
  println!("{INDENT}data dir:   {}", status.data_dir);
  println!("{INDENT}index:      {} ({} dimensions)", status.index_name, status.dimension);
  println!("{INDENT}embeddings: {}", status.embedding_model);
  println!("{INDENT}generation: {}", status.generation_model);
}

pub fn display_log_entry(log: &LogEntry) {
  let level = log.level.to_string();
  let level_colored = match log.level {
    LogLevel::Error => level.red().bold(),
    LogLevel::Warn => level.yellow().bold(),
    LogLevel::Info => level.blue().bold(),
    LogLevel::Success => level.bright_green().bold(),
    LogLevel::Verbose => level.dimmed(),
  };

  println!(
    "{} [{}] {} {}",
    log.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().cyan(),
    level_colored,
    format!("[{}]", log.component).dimmed(),
    log.message
  );

  let Some(context) = &log.context else {
    return;
  };

  let mut parts = Vec::new();
  if let Some(request_id) = &context.request_id {
    parts.push(format!("request_id: {}", request_id.bright_blue()));
  }
  if let (Some(method), Some(path)) = (&context.method, &context.path) {
    parts.push(format!("{} {}", method.magenta().bold(), path.cyan()));
  }
  if let Some(status_code) = context.status_code {
    let status = match status_code {
      200..=299 => status_code.to_string().green(),
      400..=499 => status_code.to_string().yellow(),
      500..=599 => status_code.to_string().bright_red().bold(),
      _ => status_code.to_string().white(),
    };
    parts.push(format!("status: {status}"));
  }
  if let Some(duration) = context.duration_ms {
    parts.push(format!("duration: {duration:.2}ms"));
  }

  for part in parts {
    println!("  {} {}", "└─".white().dimmed(), part);
  }
}
