//! issuectl - a terminal client for a tracker's issue API.
//!
//! Subcommands map onto the tracker endpoints: `list` drives the filtered,
//! sorted, paginated issue list; `create`/`edit`/`verify` go through the
//! same draft validation and submission rules the interactive form uses.

use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use issuectl::api::types::{Issue, IssueStatus, Priority, SortKey, SortOrder};
use issuectl::api::{IssueApi, TrackerClient};
use issuectl::config::Config;
use issuectl::form::FormController;
use issuectl::pagination::Pager;
use issuectl::query::QueryState;
use issuectl::{logging, AppError};

#[derive(Parser)]
#[command(name = "issuectl", version, about = "Terminal client for the issue tracker")]
struct Cli {
    /// Profile to use (defaults to the configured default profile).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List issues with optional filters.
    List {
        /// Search title and description text.
        #[arg(long)]
        search: Option<String>,
        /// Filter by status (open, in_progress, resolved, verified, closed).
        #[arg(long)]
        status: Option<IssueStatus>,
        /// Filter by priority (low, medium, high, critical).
        #[arg(long)]
        priority: Option<Priority>,
        /// Filter by assignee display name.
        #[arg(long)]
        assignee: Option<String>,
        /// Sort column (id, created_at, updated_at, priority, issue_status, title).
        #[arg(long)]
        sort_by: Option<SortKey>,
        /// Sort direction (asc, desc).
        #[arg(long)]
        order: Option<SortOrder>,
        /// Page to fetch (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Issues per page (5, 10, 20, 50).
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show a single issue.
    Show {
        /// The issue id.
        id: i64,
    },

    /// Create a new issue.
    Create {
        /// The issue title.
        #[arg(long)]
        title: String,
        /// Free-form description.
        #[arg(long)]
        description: Option<String>,
        /// Initial status (defaults to open).
        #[arg(long)]
        status: Option<IssueStatus>,
        /// Priority (defaults to medium).
        #[arg(long)]
        priority: Option<Priority>,
        /// Assignee id; omit to let the server auto-assign.
        #[arg(long)]
        assignee: Option<i64>,
        /// Verifier id; required when status is verified.
        #[arg(long)]
        verifier: Option<i64>,
    },

    /// Edit an existing issue.
    Edit {
        /// The issue id.
        id: i64,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// New status.
        #[arg(long)]
        status: Option<IssueStatus>,
        /// New priority.
        #[arg(long)]
        priority: Option<Priority>,
        /// New assignee id.
        #[arg(long)]
        assignee: Option<i64>,
        /// Verifier id; required when moving to verified.
        #[arg(long)]
        verifier: Option<i64>,
    },

    /// Mark an issue verified.
    Verify {
        /// The issue id.
        id: i64,
        /// The verifier id.
        #[arg(long)]
        verifier: i64,
    },

    /// List the assignee roster.
    Assignees {
        /// Show only assignees eligible for auto-assignment today.
        #[arg(long)]
        available: bool,
    },

    /// Check that the tracker is reachable.
    Ping,
}

/// One row of the issue table.
#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl IssueRow {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            title: issue.title.clone(),
            status: issue.issue_status.to_string(),
            priority: issue.priority.to_string(),
            assignee: issue.assignee_name().to_string(),
            updated: issue.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("warning: logging disabled: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::load()?;
    let profile = config.resolve_profile(cli.profile.as_deref())?;
    let client = TrackerClient::new(&profile)?;
    let json = cli.json;

    match cli.command {
        Command::List {
            search,
            status,
            priority,
            assignee,
            sort_by,
            order,
            page,
            page_size,
        } => {
            let mut query = QueryState::with_page_size(
                page_size.unwrap_or(config.settings.page_size),
            );
            if let Some(search) = search {
                query.set_search(search);
            }
            query.set_status(status);
            query.set_priority(priority);
            query.set_assignee(assignee);
            if let Some(sort_by) = sort_by {
                query.set_sort_by(sort_by);
            }
            if let Some(order) = order {
                query.set_order(order);
            }
            query.set_page(page);

            let result = client.list_issues(&query.to_params()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
            } else {
                print_page(&result.issues, Pager::from_page(&result), result.total_count);
            }
        }

        Command::Show { id } => {
            let issue = client.get_issue(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&issue).unwrap_or_default());
            } else {
                print_issue(&issue);
            }
        }

        Command::Create {
            title,
            description,
            status,
            priority,
            assignee,
            verifier,
        } => {
            let mut controller = FormController::create();
            {
                let draft = controller.draft_mut();
                draft.title = title;
                draft.description = description;
                if let Some(status) = status {
                    draft.status = status;
                }
                if let Some(priority) = priority {
                    draft.priority = priority;
                }
                draft.assignee_id = assignee;
                draft.verifier_id = verifier;
            }

            let issue = controller.submit(&client).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&issue).unwrap_or_default());
            } else {
                println!("Created issue #{} ({})", issue.id, issue.issue_status);
            }
        }

        Command::Edit {
            id,
            title,
            description,
            status,
            priority,
            assignee,
            verifier,
        } => {
            // Pre-populate from the current issue, then overlay the flags,
            // the same way the edit form pre-fills its draft.
            let current = client.get_issue(id).await?;
            let mut controller = FormController::edit(&current);
            {
                let draft = controller.draft_mut();
                if let Some(title) = title {
                    draft.title = title;
                }
                if let Some(description) = description {
                    draft.description = Some(description);
                }
                if let Some(status) = status {
                    draft.status = status;
                }
                if let Some(priority) = priority {
                    draft.priority = priority;
                }
                if let Some(assignee) = assignee {
                    draft.assignee_id = Some(assignee);
                }
                if let Some(verifier) = verifier {
                    draft.verifier_id = Some(verifier);
                }
            }

            let issue = controller.submit(&client).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&issue).unwrap_or_default());
            } else {
                println!("Updated issue #{} ({})", issue.id, issue.issue_status);
            }
        }

        Command::Verify { id, verifier } => {
            let issue = client.verify_issue(id, verifier).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&issue).unwrap_or_default());
            } else {
                println!(
                    "Issue #{} verified by {}",
                    issue.id,
                    issue.verifier_name()
                );
            }
        }

        Command::Assignees { available } => {
            let assignees = if available {
                client.available_assignees().await?
            } else {
                client.assignees().await?
            };
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&assignees).unwrap_or_default()
                );
            } else if assignees.is_empty() {
                println!("No assignees");
            } else {
                for assignee in &assignees {
                    println!("{:>4}  {}", assignee.id, assignee.name);
                }
            }
        }

        Command::Ping => {
            client.health().await?;
            println!("ok: {}", client.base_url());
        }
    }

    Ok(())
}

fn print_page(issues: &[Issue], pager: Pager, total_count: u64) {
    if issues.is_empty() {
        println!("No issues found");
    } else {
        let rows: Vec<IssueRow> = issues.iter().map(IssueRow::from_issue).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    println!(
        "Page {} of {} ({} issues)",
        pager.current_page, pager.total_pages, total_count
    );
}

fn print_issue(issue: &Issue) {
    println!("Issue #{}", issue.id);
    println!("  Title:       {}", issue.title);
    println!("  Status:      {}", issue.issue_status);
    println!("  Priority:    {}", issue.priority);
    println!("  Assignee:    {}", issue.assignee_name());
    if issue.issue_status == IssueStatus::Verified {
        println!("  Verifier:    {}", issue.verifier_name());
    }
    if let Some(description) = &issue.issue_description {
        println!("  Description: {}", description);
    }
    println!("  Created:     {}", issue.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated:     {}", issue.updated_at.format("%Y-%m-%d %H:%M"));
}
