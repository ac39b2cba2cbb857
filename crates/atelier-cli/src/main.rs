//! Atelier CLI — terminal front-end for the Atelier workshop platform.
//!
//! Talks to the same backend REST API as the web app, through the
//! access layer and state orchestrator in atelier-core.

use std::path::PathBuf;

use atelier_cli::commands::{self, workshop::ListOptions, Context};
use atelier_core::config::DEFAULT_API_URL;
use atelier_core::models::{NewWorkshop, WorkshopCategory};
use clap::{Parser, Subcommand};

/// Atelier CLI — community workshops, enrollments, and certificates
#[derive(Parser)]
#[command(name = "atelier", version, about = "Atelier CLI — community workshops, enrollments, and certificates")]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "ATELIER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// ID of the acting user
    #[arg(long, env = "ATELIER_USER_ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage workshops
    Workshop {
        #[command(subcommand)]
        action: WorkshopAction,
    },

    /// List your enrollments
    Enrollments {
        /// Only enrollments in this status: enrolled, waitlisted, completed, cancelled, no_show
        #[arg(long)]
        status: Option<String>,
    },

    /// Manage certificates
    Certificate {
        #[command(subcommand)]
        action: CertificateAction,
    },

    /// Show your workshop statistics
    Stats,
}

#[derive(Subcommand)]
enum WorkshopAction {
    /// List available workshops
    List {
        /// Keep only workshops in this status (filtered locally)
        #[arg(long)]
        status: Option<String>,
        /// Category, e.g. data-science, machine-learning
        #[arg(long)]
        category: Option<String>,
        /// Creator user ID
        #[arg(long)]
        creator: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show one workshop
    Get {
        /// Workshop ID
        id: String,
    },
    /// List participants of a workshop
    Participants {
        /// Workshop ID
        id: String,
    },
    /// Show enrollment statistics for a workshop
    Stats {
        /// Workshop ID
        id: String,
    },
    /// Enroll in a workshop
    Enroll {
        /// Workshop ID
        id: String,
    },
    /// Leave a workshop
    Unenroll {
        /// Workshop ID
        id: String,
    },
    /// Show your enrollment status for a workshop
    Status {
        /// Workshop ID
        id: String,
    },
    /// Create a workshop (as a draft)
    Create {
        #[arg(long)]
        title: String,
        /// Calendar date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Start time, HH:MM
        #[arg(long)]
        start_time: String,
        /// End time, HH:MM
        #[arg(long)]
        end_time: String,
        #[arg(long)]
        max_participants: u32,
        #[arg(long, default_value = "")]
        description: String,
        /// Category, e.g. data-science, machine-learning
        #[arg(long)]
        category: Option<String>,
        /// Tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
        #[arg(long)]
        allow_waitlist: bool,
    },
    /// Publish a workshop
    Publish {
        /// Workshop ID
        id: String,
    },
    /// Cancel a workshop and notify its participants
    Cancel {
        /// Workshop ID
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Mark a workshop as completed
    Complete {
        /// Workshop ID
        id: String,
    },
    /// Delete a workshop
    Delete {
        /// Workshop ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CertificateAction {
    /// List your certificates
    List,
    /// Show one certificate
    Get {
        /// Certificate ID
        id: String,
    },
    /// Verify a certificate by its public code (exit code 1 when not valid)
    Verify {
        /// Verification code
        code: String,
    },
    /// Download a certificate PDF
    Download {
        /// Certificate ID
        id: String,
        /// Output file (default: <id>.pdf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Create a shareable link for a certificate
    Share {
        /// Certificate ID
        id: String,
    },
    /// Issue your certificate for a completed workshop
    Issue {
        /// Workshop ID
        workshop_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_core=warn,atelier_cli=info".into()),
        )
        .init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help().ok();
        println!();
        return;
    };

    let ctx = Context::new(&cli.api_url, cli.user.as_deref());

    let result = match command {
        Commands::Workshop { action } => match action {
            WorkshopAction::List {
                status,
                category,
                creator,
                search,
                page,
                limit,
            } => {
                let options = ListOptions {
                    status,
                    category,
                    creator,
                    search,
                    page,
                    limit,
                };
                commands::workshop::list(&ctx, options).await
            }
            WorkshopAction::Get { id } => commands::workshop::get(&ctx, &id).await,
            WorkshopAction::Participants { id } => {
                commands::workshop::participants(&ctx, &id).await
            }
            WorkshopAction::Stats { id } => commands::workshop::stats(&ctx, &id).await,
            WorkshopAction::Enroll { id } => commands::workshop::enroll(&ctx, &id).await,
            WorkshopAction::Unenroll { id } => commands::workshop::unenroll(&ctx, &id).await,
            WorkshopAction::Status { id } => commands::workshop::status(&ctx, &id).await,
            WorkshopAction::Create {
                title,
                date,
                start_time,
                end_time,
                max_participants,
                description,
                category,
                tags,
                allow_waitlist,
            } => {
                let category = match category
                    .as_deref()
                    .map(str::parse::<WorkshopCategory>)
                    .transpose()
                {
                    Ok(category) => category.unwrap_or_default(),
                    Err(e) => exit_with(e),
                };
                let draft = NewWorkshop {
                    title,
                    description,
                    category,
                    date,
                    start_time,
                    end_time,
                    max_participants,
                    tags: tags.unwrap_or_default(),
                    allow_waitlist,
                    ..Default::default()
                };
                commands::workshop::create(&ctx, draft).await
            }
            WorkshopAction::Publish { id } => commands::workshop::publish(&ctx, &id).await,
            WorkshopAction::Cancel { id, reason } => {
                commands::workshop::cancel(&ctx, &id, reason.as_deref()).await
            }
            WorkshopAction::Complete { id } => commands::workshop::complete(&ctx, &id).await,
            WorkshopAction::Delete { id } => commands::workshop::delete(&ctx, &id).await,
        },

        Commands::Enrollments { status } => {
            commands::enrollment::list(&ctx, status.as_deref()).await
        }

        Commands::Certificate { action } => match action {
            CertificateAction::List => commands::certificate::list(&ctx).await,
            CertificateAction::Get { id } => commands::certificate::get(&ctx, &id).await,
            CertificateAction::Verify { code } => commands::certificate::verify(&ctx, &code).await,
            CertificateAction::Download { id, output } => {
                commands::certificate::download(&ctx, &id, output.as_deref()).await
            }
            CertificateAction::Share { id } => commands::certificate::share(&ctx, &id).await,
            CertificateAction::Issue { workshop_id } => {
                commands::certificate::issue(&ctx, &workshop_id).await
            }
        },

        Commands::Stats => commands::stats::show(&ctx).await,
    };

    if let Err(e) = result {
        exit_with(e);
    }
}

fn exit_with(message: String) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
