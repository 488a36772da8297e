//! Issue an API key
//!
//! Run with: cargo run --bin issue_api_key -- --name ops --permissions admin [--tenant 3]
//!
//! Only the SHA-256 digest is stored; the plaintext key is printed once.

use anyhow::{bail, Context};
use rand::RngCore;
use tenant_admin::api::middleware::{hash_api_key, permissions};
use tenant_admin::{db, Config};
use uuid::Uuid;

const KNOWN_PERMISSIONS: &[&str] = &[
    permissions::ADMIN,
    permissions::READ_USERS,
    permissions::WRITE_USERS,
    permissions::READ_ROLES,
    permissions::WRITE_ROLES,
    permissions::MANAGE_TENANTS,
];

fn arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let name = arg(&args, "--name").context("--name is required")?;
    let permissions: Vec<String> = arg(&args, "--permissions")
        .unwrap_or_else(|| permissions::ADMIN.to_string())
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    let tenant_id: Option<i64> = arg(&args, "--tenant")
        .map(|t| t.parse())
        .transpose()
        .context("--tenant must be an integer")?;

    if let Some(unknown) = permissions
        .iter()
        .find(|p| !KNOWN_PERMISSIONS.contains(&p.as_str()))
    {
        bail!("unknown permission {unknown}, expected one of {KNOWN_PERMISSIONS:?}");
    }

    let mut secret = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut secret);
    let key = format!("ta_{}", hex::encode(secret));
    let prefix = &key[..8];

    let config = Config::from_env().context("failed to read configuration")?;
    let pool = db::connect(&config)
        .await
        .context("failed to connect to PostgreSQL")?;

    sqlx::query(
        r#"
        INSERT INTO api_keys (id, name, key_hash, key_prefix, permissions, tenant_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(hash_api_key(&key))
    .bind(prefix)
    .bind(&permissions)
    .bind(tenant_id)
    .execute(&pool)
    .await
    .context("failed to store API key")?;

    println!("API key for {name}: {key}");
    println!("Store it now, it cannot be shown again.");
    Ok(())
}
