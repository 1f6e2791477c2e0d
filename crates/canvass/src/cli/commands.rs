use anyhow::Result;
use colored::*;

use crate::cli::client::CanvassClient;
use crate::cli::display::{
  display_ask_response, display_form, display_log_entry, display_status,
};
use crate::server::models::QueryScope;
use crate::server::types::SubmitFeedbackRequest;

/// Ask a question over collected feedback
pub async fn ask(
  client: &CanvassClient,
  question: &str,
  scope: &QueryScope,
  raw: bool,
) -> Result<()> {
  let response = client.ask(question, scope).await?;

  if raw {
    println!("{}", response.answer.raw);
  } else {
    display_ask_response(&response);
  }
  Ok(())
}

/// Submit one piece of feedback
pub async fn submit(
  client: &CanvassClient,
  customer_name: &str,
  feedback: &str,
  rating: i64,
  form_id: Option<String>,
) -> Result<()> {
  let request = SubmitFeedbackRequest {
    customer_name: customer_name.to_string(),
    feedback: feedback.to_string(),
    rating,
    form_id,
  };
  let response = client.submit_feedback(&request).await?;

  println!(
    "{} Recorded feedback from {} ({})",
    "✓".green(),
    response.feedback.customer_name.cyan(),
    response.feedback.id.to_string().dimmed()
  );
  if !response.indexed {
    println!(
      "{} Saved, but not yet searchable; questions will still count it in stats",
      "!".yellow()
    );
  }
  Ok(())
}

/// Show a form with its feedback
pub async fn form(client: &CanvassClient, form_url_id: &str) -> Result<()> {
  let details = client.get_form(form_url_id).await?;
  display_form(&details);
  Ok(())
}

pub async fn status(client: &CanvassClient) -> Result<()> {
  let status = client.status().await?;
  display_status(client.base_url(), &status);
  Ok(())
}

/// Query server logs for debugging and monitoring
pub async fn logs(client: &CanvassClient, limit: usize, level: Option<&str>) -> Result<()> {
  let response = client.get_logs(limit, level).await?;

  if response.logs.is_empty() {
    println!("No logs found.");
    return Ok(());
  }

  for log in &response.logs {
    display_log_entry(log);
  }
  Ok(())
}
