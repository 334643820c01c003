//! # Reachr CLI (`reachr`)
//!
//! ## Usage
//!
//! ```bash
//! reachr --config ./config/reachr.toml --user <id> <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `reachr init` | Prepare storage (directories or SQLite schema) |
//! | `reachr list` | List contacts, optionally filtered |
//! | `reachr add <name>` | Create a contact |
//! | `reachr get <id>` | Show one contact |
//! | `reachr update <id>` | Change or clear fields of a contact |
//! | `reachr delete <id>` | Delete a contact |
//! | `reachr search "<query>"` | Weighted search |
//! | `reachr tags` | Autocomplete tag list |
//! | `reachr tag add/remove <tag>` | Manage custom tags |
//! | `reachr industry <id>` | Select an industry |
//! | `reachr prefs` | Show preferences |
//! | `reachr migrate` | Merge the legacy shared collection |
//! | `reachr industries` | Industry catalog |
//! | `reachr users` | Users holding contacts |
//! | `reachr serve` | Start the HTTP server |

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use reachr::app::App;
use reachr::config::{self, Config};
use reachr::{cli, logging, server};
use reachr_core::{ContactFilter, ContactPatch, NewContact, UserId};

/// Reachr: a personal networking contact book.
///
/// All commands accept `--config` pointing to a TOML file and `--user`
/// naming the account to act as.
#[derive(Parser)]
#[command(
    name = "reachr",
    about = "Reachr: a personal networking contact book with weighted search and tag autocomplete",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply when it is missing.
    #[arg(long, global = true, default_value = "./config/reachr.toml")]
    config: PathBuf,

    /// Account id to act as. `anonymous` uses the shared collection.
    #[arg(long, global = true, default_value = "anonymous")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare storage. Idempotent.
    Init,

    /// List contacts in stored order.
    List {
        /// Only contacts in this industry (case-insensitive).
        #[arg(long)]
        industry: Option<String>,

        /// Only contacts at this location (case-insensitive).
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Create a contact.
    Add {
        name: String,

        #[command(flatten)]
        fields: ContactFields,

        /// Tag to attach. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show one contact.
    Get { id: String },

    /// Update the given fields of a contact.
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: ContactFields,

        /// Replace the tag list. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove every tag.
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        /// Clear an optional field (e.g. `--clear phone`). Repeatable.
        #[arg(long = "clear")]
        clear: Vec<String>,
    },

    /// Delete a contact.
    Delete { id: String },

    /// Weighted substring search over the user's contacts.
    Search { query: String },

    /// Autocomplete tags with counts and sources.
    Tags,

    /// Manage custom tags.
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Select an industry and load its suggested tags.
    Industry { id: String },

    /// Show the user's preferences.
    Prefs,

    /// Merge the legacy shared collection into the user's contacts.
    Migrate,

    /// List the industry catalog.
    Industries,

    /// List users that hold contacts.
    Users,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum TagAction {
    Add { tag: String },
    Remove { tag: String },
}

/// Optional contact fields shared by `add` and `update`.
#[derive(Args)]
struct ContactFields {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    company: Option<String>,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    industry: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    linkedin_url: Option<String>,
    /// Free-text notes.
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    met_date: Option<String>,
    #[arg(long)]
    meeting_location: Option<String>,
    #[arg(long)]
    priority: Option<i32>,
}

impl ContactFields {
    fn into_new_contact(self, name: String, tags: Vec<String>) -> NewContact {
        NewContact {
            name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            role: self.role,
            industry: self.industry,
            location: self.location,
            linkedin_url: self.linkedin_url,
            tags,
            raw_context: self.notes,
            met_date: self.met_date,
            meeting_location: self.meeting_location,
            priority: self.priority,
        }
    }

    fn into_patch(self, name: Option<String>, tags: Option<Vec<String>>) -> ContactPatch {
        ContactPatch {
            name,
            email: self.email.map(Some),
            phone: self.phone.map(Some),
            company: self.company.map(Some),
            role: self.role.map(Some),
            industry: self.industry.map(Some),
            location: self.location.map(Some),
            linkedin_url: self.linkedin_url.map(Some),
            tags,
            raw_context: self.notes.map(Some),
            met_date: self.met_date.map(Some),
            meeting_location: self.meeting_location.map(Some),
            priority: self.priority,
        }
    }
}

fn clear_field(patch: &mut ContactPatch, field: &str) -> Result<()> {
    let slot = match field {
        "email" => &mut patch.email,
        "phone" => &mut patch.phone,
        "company" => &mut patch.company,
        "role" => &mut patch.role,
        "industry" => &mut patch.industry,
        "location" => &mut patch.location,
        "linkedin_url" => &mut patch.linkedin_url,
        "notes" | "raw_context" => &mut patch.raw_context,
        "met_date" => &mut patch.met_date,
        "meeting_location" => &mut patch.meeting_location,
        other => anyhow::bail!("Cannot clear field '{}'", other),
    };
    *slot = Some(None);
    Ok(())
}

fn load(path: &std::path::Path) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load(&cli.config)?;
    logging::init_logging(&cfg.logging);

    let user = UserId::parse(&cli.user)?;

    match cli.command {
        Commands::Init => {
            App::open(&cfg).await?;
            println!("Storage initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Industries => {
            let app = App::open(&cfg).await?;
            cli::run_industries(&app);
        }
        command => {
            let app = App::open(&cfg).await?;
            run_command(&app, &user, command).await?;
        }
    }

    Ok(())
}

async fn run_command(app: &App, user: &UserId, command: Commands) -> Result<()> {
    match command {
        Commands::List {
            industry,
            location,
            limit,
        } => {
            let filter = ContactFilter {
                industry,
                location,
                limit,
            };
            cli::run_list(app, user, &filter).await
        }
        Commands::Add { name, fields, tags } => {
            cli::run_add(app, user, fields.into_new_contact(name, tags)).await
        }
        Commands::Get { id } => cli::run_get(app, user, &id).await,
        Commands::Update {
            id,
            name,
            fields,
            tags,
            clear_tags,
            clear,
        } => {
            let tags = if clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags)
            };
            let mut patch = fields.into_patch(name, tags);
            for field in &clear {
                clear_field(&mut patch, field)?;
            }
            cli::run_update(app, user, &id, patch).await
        }
        Commands::Delete { id } => cli::run_delete(app, user, &id).await,
        Commands::Search { query } => cli::run_search(app, user, &query).await,
        Commands::Tags => cli::run_tags(app, user).await,
        Commands::Tag { action } => match action {
            TagAction::Add { tag } => cli::run_tag_add(app, user, &tag).await,
            TagAction::Remove { tag } => cli::run_tag_remove(app, user, &tag).await,
        },
        Commands::Industry { id } => cli::run_industry(app, user, &id).await,
        Commands::Prefs => cli::run_prefs(app, user).await,
        Commands::Migrate => cli::run_migrate(app, user).await,
        Commands::Users => cli::run_users(app).await,
        Commands::Init | Commands::Serve | Commands::Industries => Ok(()),
    }
}
