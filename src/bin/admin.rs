//! CLI administration tool for tourify.
//!
//! Provides commands for loading development data, managing roles,
//! viewing statistics, and checking the database without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Import tours, users and reviews from dev-data/
//! cargo run --bin admin -- data import dev-data
//!
//! # Remove every tour, user and review
//! cargo run --bin admin -- data delete
//!
//! # Grant a role
//! cargo run --bin admin -- user promote laura@example.com lead-guide
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string

use tourify::application::services::{PasswordService, ReviewService};
use tourify::domain::document::{Document, timestamp};
use tourify::domain::entities::user::normalize_email;
use tourify::domain::entities::{Review, Role, Tour, User};
use tourify::domain::query::Filter;
use tourify::domain::repositories::{Collection, DocumentStore};
use tourify::infrastructure::persistence::PgDocumentStore;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// CLI tool for managing tourify.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Load or remove development data
    Data {
        #[command(subcommand)]
        action: DataAction,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Show document counts
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DataAction {
    /// Import tours.json, users.json and reviews.json from a directory
    Import {
        /// Directory holding the JSON files
        dir: PathBuf,
    },

    /// Delete every tour, user and review
    Delete {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change the role of an account
    Promote {
        email: String,

        /// user, guide, lead-guide or admin
        role: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(Arc::new(pool)));

    match cli.command {
        Commands::Data { action } => handle_data_action(action, store).await?,
        Commands::User { action } => handle_user_action(action, store).await?,
        Commands::Stats => handle_stats(store).await?,
        Commands::Db { action } => handle_db_action(action, store).await?,
    }

    Ok(())
}

async fn handle_data_action(action: DataAction, store: Arc<dyn DocumentStore>) -> Result<()> {
    match action {
        DataAction::Import { dir } => import_data(&dir, store).await,
        DataAction::Delete { yes } => delete_data(yes, store).await,
    }
}

/// Imports development data.
///
/// # Flow
///
/// 1. Read `users.json`, `tours.json` and `reviews.json` (arrays of documents)
/// 2. Fill `id` and `createdAt` where absent
/// 3. Hash plaintext user passwords
/// 4. Insert users, then tours, then reviews
/// 5. Recompute the rating summary of every imported tour
async fn import_data(dir: &Path, store: Arc<dyn DocumentStore>) -> Result<()> {
    println!("{}", "📦 Import development data".bright_blue().bold());
    println!();

    let users: Collection<User> = Collection::new(store.clone());
    let tours: Collection<Tour> = Collection::new(store.clone());
    let reviews: Collection<Review> = Collection::new(store.clone());
    let passwords = PasswordService::new();

    let mut imported_users = 0;
    for mut doc in read_documents(&dir.join("users.json"))? {
        if let Some(plain) = doc.get("password").and_then(Value::as_str)
            && !plain.starts_with("$argon2")
        {
            let hashed = passwords.hash(plain).await?;
            doc.insert("password".to_string(), json!(hashed));
        }
        let user: User = decode(doc, "user")?;
        users.insert(&user).await.map_err(|e| anyhow!("User {}: {e}", user.email))?;
        imported_users += 1;
    }

    let mut tour_ids = Vec::new();
    for doc in read_documents(&dir.join("tours.json"))? {
        let tour: Tour = decode(doc, "tour")?;
        tours.insert(&tour).await.map_err(|e| anyhow!("Tour {}: {e}", tour.name))?;
        tour_ids.push(tour.id);
    }

    let mut imported_reviews = 0;
    for doc in read_documents(&dir.join("reviews.json"))? {
        let review: Review = decode(doc, "review")?;
        reviews.insert(&review).await.map_err(|e| anyhow!("Review {}: {e}", review.id))?;
        imported_reviews += 1;
    }

    let ratings = ReviewService::new(reviews, tours, users);
    for id in &tour_ids {
        ratings.recompute_ratings(*id).await?;
    }

    println!("  Users:   {}", imported_users.to_string().bright_green().bold());
    println!("  Tours:   {}", tour_ids.len().to_string().bright_green().bold());
    println!("  Reviews: {}", imported_reviews.to_string().bright_green().bold());
    println!();
    println!("{}", "✅ Data imported".green().bold());

    Ok(())
}

fn read_documents(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let docs: Vec<Map<String, Value>> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must hold an array of objects", path.display()))?;

    let now = Utc::now();
    Ok(docs
        .into_iter()
        .map(|mut doc| {
            doc.entry("id").or_insert_with(|| json!(Uuid::new_v4()));
            doc.entry("createdAt").or_insert_with(|| json!(timestamp::format(&now)));
            doc
        })
        .collect())
}

fn decode<T: DeserializeOwned>(doc: Map<String, Value>, label: &str) -> Result<T> {
    let id = doc.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(Value::Object(doc)).with_context(|| format!("Invalid {label} {id}"))
}

/// Removes all documents after confirmation (default: No).
async fn delete_data(skip_confirm: bool, store: Arc<dyn DocumentStore>) -> Result<()> {
    println!("{}", "🗑  Delete all data".bright_blue().bold());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete every tour, user and review?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let everything = Filter::new();
    let reviews = store.delete_many(&Review::COLLECTION, &everything).await?;
    let tours = store.delete_many(&Tour::COLLECTION, &everything).await?;
    let users = store.delete_many(&User::COLLECTION, &everything).await?;

    println!(
        "  Removed {} reviews, {} tours, {} users",
        reviews.to_string().bright_white(),
        tours.to_string().bright_white(),
        users.to_string().bright_white()
    );
    println!("{}", "✅ Data deleted".green().bold());

    Ok(())
}

async fn handle_user_action(action: UserAction, store: Arc<dyn DocumentStore>) -> Result<()> {
    match action {
        UserAction::Promote { email, role } => {
            let role: Role = role.parse()?;
            let users: Collection<User> = Collection::new(store);

            let user = users
                .find_one(Filter::new().eq("email", normalize_email(&email)))
                .await?
                .context("No active user with that email")?;

            let mut changes = Map::new();
            changes.insert("role".to_string(), json!(role));
            users.update_by_id(user.id, changes).await?;

            println!(
                "{} {} is now {}",
                "✅".green(),
                user.email.cyan(),
                role.to_string().bright_yellow().bold()
            );
        }
    }

    Ok(())
}

/// Displays raw document counts, inactive users and secret tours included.
async fn handle_stats(store: Arc<dyn DocumentStore>) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let everything = Filter::new();
    let tours = store.count(&Tour::COLLECTION, &everything).await?;
    let users = store.count(&User::COLLECTION, &everything).await?;
    let reviews = store.count(&Review::COLLECTION, &everything).await?;
    let inactive = store
        .count(&User::COLLECTION, &Filter::new().eq("active", false))
        .await?;

    println!("  Tours:          {}", tours.to_string().bright_green().bold());
    println!("  Users:          {}", users.to_string().bright_green().bold());
    println!("  Inactive users: {}", inactive.to_string().bright_black());
    println!("  Reviews:        {}", reviews.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, store: Arc<dyn DocumentStore>) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            store.ping().await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
    }

    Ok(())
}
