//! Document store for forms and submitted feedback
//!
//! The pipeline only depends on [`FeedbackStore`]. [`JsonlFeedbackStore`]
//! keeps records as JSON lines under the data directory so the service can
//! run without an external database.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::server::models::{FeedbackRecord, Form};

const FEEDBACK_FILE: &str = "feedback.jsonl";
const FORMS_FILE: &str = "forms.jsonl";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackStore: Send + Sync {
  /// Feedback submitted against one form, oldest first
  async fn load_by_form(&self, form_id: &str) -> Result<Vec<FeedbackRecord>>;

  /// Every stored feedback record, oldest first
  async fn load_all(&self) -> Result<Vec<FeedbackRecord>>;

  async fn find_form(&self, form_id: &str) -> Result<Option<Form>>;

  async fn find_form_by_url_id(&self, form_url_id: &str) -> Result<Option<Form>>;

  async fn insert_feedback(&self, record: &FeedbackRecord) -> Result<()>;

  async fn create_form(&self, form: &Form) -> Result<()>;
}

pub struct JsonlFeedbackStore {
  dir: PathBuf,
  // Serializes appends so lines from concurrent writers never interleave
  write_lock: Mutex<()>,
}

impl JsonlFeedbackStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into(), write_lock: Mutex::new(()) }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn feedback_path(&self) -> PathBuf {
    self.dir.join(FEEDBACK_FILE)
  }

  fn forms_path(&self) -> PathBuf {
    self.dir.join(FORMS_FILE)
  }

  async fn append<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
    let mut line = serde_json::to_string(value).map_err(store_error)?;
    line.push('\n');

    let _guard = self.write_lock.lock().await;
    tokio::fs::create_dir_all(&self.dir).await.map_err(store_error)?;

    let mut file = tokio::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(path)
      .await
      .map_err(store_error)?;
    file.write_all(line.as_bytes()).await.map_err(store_error)?;
    file.flush().await.map_err(store_error)?;
    Ok(())
  }

  async fn read_all<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
    let content = match tokio::fs::read_to_string(path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(store_error(e)),
    };

    let mut items = Vec::new();
    for (number, line) in content.lines().enumerate() {
      if line.trim().is_empty() {
        continue;
      }
      match serde_json::from_str(line) {
        Ok(item) => items.push(item),
        Err(e) => {
          tracing::warn!(
            file = %path.display(),
            line = number + 1,
            error = %e,
            "skipping unreadable record"
          );
        }
      }
    }
    Ok(items)
  }
}

#[async_trait]
impl FeedbackStore for JsonlFeedbackStore {
  async fn load_by_form(&self, form_id: &str) -> Result<Vec<FeedbackRecord>> {
    let records: Vec<FeedbackRecord> = self.read_all(&self.feedback_path()).await?;
    Ok(records.into_iter().filter(|r| r.form_id.as_deref() == Some(form_id)).collect())
  }

  async fn load_all(&self) -> Result<Vec<FeedbackRecord>> {
    self.read_all(&self.feedback_path()).await
  }

  async fn find_form(&self, form_id: &str) -> Result<Option<Form>> {
    let forms: Vec<Form> = self.read_all(&self.forms_path()).await?;
    Ok(forms.into_iter().find(|form| form.id == form_id))
  }

  async fn find_form_by_url_id(&self, form_url_id: &str) -> Result<Option<Form>> {
    let forms: Vec<Form> = self.read_all(&self.forms_path()).await?;
    Ok(forms.into_iter().find(|form| form.form_url_id == form_url_id))
  }

  async fn insert_feedback(&self, record: &FeedbackRecord) -> Result<()> {
    self.append(&self.feedback_path(), record).await
  }

  async fn create_form(&self, form: &Form) -> Result<()> {
    if self.find_form_by_url_id(&form.form_url_id).await?.is_some() {
      return Err(PipelineError::Validation(format!(
        "A form with url id '{}' already exists",
        form.form_url_id
      )));
    }
    self.append(&self.forms_path(), form).await
  }
}

fn store_error(error: impl std::fmt::Display) -> PipelineError {
  PipelineError::Store(error.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[tokio::test]
  async fn test_missing_files_read_as_empty() {
    let temp = TempDir::new().unwrap();
    let store = JsonlFeedbackStore::new(temp.path().join("feedback"));

    assert!(store.load_all().await.unwrap().is_empty());
    assert!(store.find_form("nope").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_unreadable_lines_are_skipped() {
    let temp = TempDir::new().unwrap();
    let store = JsonlFeedbackStore::new(temp.path());

    let record = FeedbackRecord::new("Amy".into(), "Great".into(), 5, None);
    store.insert_feedback(&record).await.unwrap();

    let mut file = tokio::fs::OpenOptions::new()
      .append(true)
      .open(temp.path().join(FEEDBACK_FILE))
      .await
      .unwrap();
    file.write_all(b"{not json}\n\n").await.unwrap();

    let records = store.load_all().await.unwrap();
    assert_eq!(records, vec![record]);
  }

  #[tokio::test]
  async fn test_form_url_ids_are_unique() {
    let temp = TempDir::new().unwrap();
    let store = JsonlFeedbackStore::new(temp.path());

    store.create_form(&Form::new("Checkout".into(), "checkout-2024".into())).await.unwrap();
    let duplicate = store.create_form(&Form::new("Other".into(), "checkout-2024".into())).await;
    assert!(matches!(duplicate, Err(PipelineError::Validation(_))));
  }
}
