use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use canvass::cli::client::{server_url, CanvassClient, SERVER_ENV_VAR};
use canvass::cli::commands;
use canvass::server::models::QueryScope;

#[derive(Parser)]
#[command(name = "canvass")]
#[command(about = "Canvass - Survey Feedback Question Answering\nAsk questions about collected customer feedback")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
  /// Base URL of the canvass server
  #[arg(long, global = true, env = SERVER_ENV_VAR)]
  server: Option<String>,

  #[command(subcommand)]
  command: Command,
}

/// Which form's feedback to use; all feedback when neither is given
#[derive(Args)]
#[group(multiple = false)]
struct ScopeArgs {
  /// Internal id of the form
  #[arg(long)]
  form_id: Option<String>,
  /// Public url id of the form
  #[arg(long)]
  form_url_id: Option<String>,
}

impl From<ScopeArgs> for QueryScope {
  fn from(args: ScopeArgs) -> Self {
    QueryScope { form_id: args.form_id, form_url_id: args.form_url_id }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Ask a question about the collected feedback
  Ask {
    /// The question to answer
    question: String,
    #[command(flatten)]
    scope: ScopeArgs,
    /// Print the model's reply without formatting
    #[arg(long)]
    raw: bool,
  },
  /// Submit a piece of feedback
  Submit {
    /// Feedback text
    feedback: String,
    /// Customer name
    #[arg(short, long)]
    name: String,
    /// Rating from 1 to 5
    #[arg(short, long, allow_negative_numbers = true)]
    rating: i64,
    /// Form the feedback belongs to
    #[arg(long)]
    form_id: Option<String>,
  },
  /// Show a form and its feedback
  Form {
    /// Public url id of the form
    form_url_id: String,
  },
  /// Check that the server is up
  Status,
  /// Query server logs for debugging and monitoring
  Logs {
    /// Maximum number of log entries to return
    #[arg(short, long, default_value = "50")]
    limit: usize,
    /// Only show this level (verbose, info, success, warn, error)
    #[arg(long)]
    level: Option<String>,
  },
}

async fn handle(client: &CanvassClient, command: Command) -> Result<()> {
  match command {
    Command::Ask { question, scope, raw } => {
      commands::ask(client, &question, &scope.into(), raw).await
    }
    Command::Submit { feedback, name, rating, form_id } => {
      commands::submit(client, &name, &feedback, rating, form_id).await
    }
    Command::Form { form_url_id } => commands::form(client, &form_url_id).await,
    Command::Status => commands::status(client).await,
    Command::Logs { limit, level } => commands::logs(client, limit, level.as_deref()).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let client = CanvassClient::new(&server_url(cli.server.as_deref()))?;

  handle(&client, cli.command).await
}
