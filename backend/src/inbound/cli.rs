//! Command-line surface of the hub.
//!
//! Each invocation is one session: the hub is built from settings, entity
//! commands attach the backend, run one gateway call and detach again.
//! Results are written to the supplied writer as pretty JSON. Collections
//! that failed to load are reported on the diagnostics writer, one JSON
//! line each, and the command still runs.

use std::io::{self, Write};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::app::Hub;
use crate::domain::ports::AttachReport;
use crate::domain::{
    CollectionName, CollegeEmail, Credentials, CredentialsValidationError, EntityDraft,
    EntityFilter, EntityId, EntityPatch, Error, ProfileUpdate, SignUpRequest, UserRole,
    UserValidationError,
};

/// `campus-hub` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "campus-hub",
    about = "Campus portal: announcements, marketplace, lending, hackathons and more",
    version
)]
pub struct Cli {
    /// How long to wait for remote snapshots before giving up.
    #[arg(long = "sync-timeout-ms", value_name = "ms", default_value_t = 10_000)]
    pub sync_timeout_ms: u64,
    #[command(subcommand)]
    pub command: Command,
}

/// Every command, split by whether it needs the entity backend.
#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Account(AccountCommand),
    #[command(flatten)]
    Entity(EntityCommand),
}

/// Commands served by the identity provider alone.
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create an account and sign in.
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_parser = parse_role, default_value = "student")]
        role: UserRole,
    },
    /// Sign in to an existing account.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Issue a temporary password for an account.
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in profile.
    Whoami,
    /// Complete or change the signed-in profile.
    Profile(ProfileArgs),
}

/// Commands that read or change campus entities.
#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List a collection in display order.
    List {
        collection: CollectionName,
        /// Only unsold, unresolved, available or otherwise active entries.
        #[arg(long)]
        open: bool,
        /// Only entries of this kind, e.g. `lost` or `placement`.
        #[arg(long)]
        kind: Option<String>,
    },
    /// Create an entity from a JSON draft.
    Add {
        collection: CollectionName,
        /// Draft object, e.g. `{"title":"Cycle","description":"Blue","price":500}`.
        #[arg(long)]
        json: String,
    },
    /// Apply a status patch, e.g. `{"op":"markSold"}`.
    Update {
        collection: CollectionName,
        id: EntityId,
        #[arg(long)]
        patch: String,
    },
    /// Delete an entity you own.
    Remove {
        collection: CollectionName,
        id: EntityId,
    },
    /// Join a hackathon.
    Apply { id: EntityId },
    /// Leave a hackathon.
    Withdraw { id: EntityId },
    /// Create generated demo content as the signed-in user.
    #[cfg(feature = "demo-data")]
    SeedDemo {
        #[arg(long, default_value = crate::app::DEFAULT_SEED_NAME)]
        seed: String,
        /// Registry file; defaults to the bundled one.
        #[arg(long, value_name = "path")]
        registry: Option<camino::Utf8PathBuf>,
    },
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub college: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub branch: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self {
            name: args.name,
            college: args.college,
            department: args.department,
            branch: args.branch,
            year: args.year,
        }
    }
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.message())]
    Domain(#[from] Error),
    #[error(transparent)]
    Credentials(#[from] CredentialsValidationError),
    #[error(transparent)]
    Email(#[from] UserValidationError),
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
    #[cfg(feature = "demo-data")]
    #[error(transparent)]
    Seed(#[from] crate::app::DemoSeedError),
}

fn parse_role(raw: &str) -> Result<UserRole, String> {
    match raw.trim().to_lowercase().as_str() {
        "student" => Ok(UserRole::Student),
        "faculty" => Ok(UserRole::Faculty),
        other => Err(format!("unknown role {other:?}, expected student or faculty")),
    }
}

fn emit<W: Write>(out: &mut W, value: &impl Serialize) -> Result<(), CliError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Write one line per collection that could not be loaded.
fn report_load_failures<E: Write>(
    report: &AttachReport,
    diagnostics: &mut E,
) -> io::Result<()> {
    for (collection, error) in &report.load_failures {
        let line = json!({
            "warning": "collection unavailable",
            "collection": collection,
            "error": error,
        });
        writeln!(diagnostics, "{line}")?;
    }
    Ok(())
}

/// Run one command against `hub`, writing its result to `out` and load
/// warnings to `diagnostics`.
pub async fn run<W: Write, E: Write>(
    hub: &Hub,
    command: Command,
    sync_wait: Duration,
    out: &mut W,
    diagnostics: &mut E,
) -> Result<(), CliError> {
    match command {
        Command::Account(command) => run_account_command(hub, command, out).await,
        Command::Entity(command) => {
            let report = hub.attach(sync_wait).await?;
            let result = match report_load_failures(&report, diagnostics) {
                Ok(()) => run_entity_command(hub, command, out).await,
                Err(err) => Err(CliError::Output(err)),
            };
            hub.detach().await;
            result
        }
    }
}

async fn run_account_command<W: Write>(
    hub: &Hub,
    command: AccountCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let accounts = hub.accounts();
    match command {
        AccountCommand::Signup {
            email,
            password,
            role,
        } => {
            let request = SignUpRequest::try_from_parts(&email, &password, role)?;
            emit(out, &accounts.sign_up(&request).await?)
        }
        AccountCommand::Login { email, password } => {
            let credentials = Credentials::try_from_parts(&email, &password)?;
            emit(out, &accounts.sign_in(&credentials).await?)
        }
        AccountCommand::ResetPassword { email } => {
            let email = CollegeEmail::new(email)?;
            let temporary = accounts.reset_password(&email).await?;
            emit(out, &json!({ "temporaryPassword": temporary.expose() }))
        }
        AccountCommand::Logout => {
            accounts.sign_out().await?;
            emit(out, &json!({ "signedOut": true }))
        }
        AccountCommand::Whoami => emit(out, &accounts.current_profile().await?),
        AccountCommand::Profile(args) => {
            emit(out, &accounts.update_profile(&args.into()).await?)
        }
    }
}

async fn run_entity_command<W: Write>(
    hub: &Hub,
    command: EntityCommand,
    out: &mut W,
) -> Result<(), CliError> {
    let gateway = hub.gateway();
    let session = hub.session().await?;
    match command {
        EntityCommand::List {
            collection,
            open,
            kind,
        } => {
            let mut filter = EntityFilter::new(collection);
            if open {
                filter = filter.open_only();
            }
            if let Some(kind) = kind {
                filter = filter.with_kind(&kind)?;
            }
            emit(out, &gateway.list_where(&filter))
        }
        EntityCommand::Add { collection, json } => {
            let draft = EntityDraft::decode(collection, serde_json::from_str(&json)?)?;
            emit(out, &gateway.add(&session, draft).await?)
        }
        EntityCommand::Update {
            collection,
            id,
            patch,
        } => {
            let patch: EntityPatch = serde_json::from_str(&patch)?;
            debug!(%collection, %id, op = patch.name(), "running update");
            emit(out, &gateway.update_status(&session, collection, &id, patch).await?)
        }
        EntityCommand::Remove { collection, id } => {
            gateway.remove(&session, collection, &id).await?;
            emit(out, &json!({ "removed": id }))
        }
        EntityCommand::Apply { id } => emit(out, &gateway.apply_to_hackathon(&session, &id).await?),
        EntityCommand::Withdraw { id } => {
            emit(out, &gateway.withdraw_from_hackathon(&session, &id).await?)
        }
        #[cfg(feature = "demo-data")]
        EntityCommand::SeedDemo { seed, registry } => {
            let registry = registry.unwrap_or_else(crate::app::default_registry_path);
            let outcome = crate::app::seed_demo_content(
                gateway,
                &session,
                &registry,
                &seed,
                chrono::Utc::now(),
            )
            .await?;
            emit(
                out,
                &json!({
                    "posts": outcome.posts,
                    "listings": outcome.listings,
                    "hackathons": outcome.hackathons,
                }),
            )
        }
    }
}
