//! One-shot admin provisioning. Creates the admin account named by
//! ADMIN_USERNAME / ADMIN_PASSWORD, or promotes an existing user of that
//! name. This is operational tooling, not part of the HTTP surface.

use anyhow::{bail, Context};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use currex::auth::password::hash_password;
use currex::auth::repo::{Role, User};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
    let username = std::env::var("ADMIN_USERNAME").context("ADMIN_USERNAME is required")?;
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is required")?;

    let username = username.trim().to_string();
    if username.chars().count() < 3 {
        bail!("admin username must be at least 3 characters");
    }
    if password.chars().count() < 6 {
        bail!("admin password must be at least 6 characters");
    }

    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations").run(&db).await?;

    match User::find_by_username(&db, &username).await? {
        Some(user) if user.role == Role::Admin => {
            info!(user_id = %user.id, %username, "admin already provisioned");
        }
        Some(user) => {
            User::set_role(&db, user.id, Role::Admin).await?;
            info!(user_id = %user.id, %username, "existing user promoted to admin");
        }
        None => {
            let hash = hash_password(&password)?;
            let user = User::create(&db, &username, &hash, Role::Admin).await?;
            info!(user_id = %user.id, %username, "admin account created");
        }
    }

    Ok(())
}
