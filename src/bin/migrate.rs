//! Apply database migrations
//!
//! Run with: cargo run --bin migrate

use anyhow::Context;
use tenant_admin::{db, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to read configuration")?;

    let pool = db::connect(&config)
        .await
        .context("failed to connect to PostgreSQL")?;

    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    println!("Migrations applied successfully");
    Ok(())
}
