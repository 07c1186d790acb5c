//! User administration
//!
//! All operations here run through the privilege gate with the acting
//! user's row, then log before/after snapshots like any other mutation.
//! Before snapshots are read inside the writing transaction, so each
//! logged pair reflects the row state the write actually replaced.
//! Password material never appears in snapshots; a reset logs a marker
//! field instead.

use crate::store::revlog;
use scholia_common::access::{authorize, Action, Tier};
use scholia_common::auth;
use scholia_common::db::models::{now_ms, User};
use scholia_common::error::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Parameters for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub tier: Tier,
    /// Initial password; accounts without one cannot authenticate upstream
    #[serde(default)]
    pub password: Option<String>,
}

fn snapshot(user: &User) -> Value {
    json!({
        "name": user.name,
        "tier": user.tier,
        "activated": user.activated,
    })
}

/// Load one user by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<User> {
    let row = sqlx::query("SELECT id, name, tier, activated FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => User::from_row(&row),
        None => Err(Error::NotFound(format!("user {}", id))),
    }
}

/// Load one user inside the caller's transaction
async fn get_in_tx(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<User> {
    let row = sqlx::query("SELECT id, name, tier, activated FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
    match row {
        Some(row) => User::from_row(&row),
        None => Err(Error::NotFound(format!("user {}", id))),
    }
}

/// Create one user, returning the new id. Duplicate names are conflicts.
pub async fn create(pool: &SqlitePool, actor: &User, params: &NewUser) -> Result<i64> {
    let name = params.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("user name must not be empty".to_string()));
    }
    if !authorize(actor, Action::ManageUsers) {
        return Err(Error::Authorization(format!(
            "user {} may not manage users",
            actor.name
        )));
    }

    let (hash, salt) = match &params.password {
        Some(password) => {
            let salt = auth::generate_salt();
            (auth::hash_password(password, &salt), salt)
        }
        None => (String::new(), String::new()),
    };

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, tier, activated, password_hash, password_salt, created)
        VALUES (?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(params.tier.level())
    .bind(&hash)
    .bind(&salt)
    .bind(now_ms())
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::conflict_on_unique(e, &format!("user name already exists: {}", name)))?;
    let user_id = result.last_insert_rowid();

    let data1 = json!({
        "name": name,
        "tier": params.tier,
        "activated": true,
    });
    revlog::append(&mut tx, actor.id, "users", user_id, &json!({}), &data1).await?;

    tx.commit().await?;
    Ok(user_id)
}

/// Change a user's privilege tier
pub async fn set_tier(pool: &SqlitePool, actor: &User, user_id: i64, tier: Tier) -> Result<()> {
    if !authorize(actor, Action::ManageUsers) {
        return Err(Error::Authorization(format!(
            "user {} may not manage users",
            actor.name
        )));
    }
    let mut tx = pool.begin().await?;
    let before = get_in_tx(&mut tx, user_id).await?;

    sqlx::query("UPDATE users SET tier = ? WHERE id = ?")
        .bind(tier.level())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let mut after = before.clone();
    after.tier = tier;
    revlog::append(
        &mut tx,
        actor.id,
        "users",
        user_id,
        &snapshot(&before),
        &snapshot(&after),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Activate or deactivate a user.
///
/// The gate refuses self-deactivation even for administrators.
pub async fn set_activated(
    pool: &SqlitePool,
    actor: &User,
    user_id: i64,
    activated: bool,
) -> Result<()> {
    if !authorize(actor, Action::SetActivated { user_id, activated }) {
        return Err(Error::Authorization(format!(
            "user {} may not change activation of user {}",
            actor.name, user_id
        )));
    }
    let mut tx = pool.begin().await?;
    let before = get_in_tx(&mut tx, user_id).await?;

    sqlx::query("UPDATE users SET activated = ? WHERE id = ?")
        .bind(activated)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let mut after = before.clone();
    after.activated = activated;
    revlog::append(
        &mut tx,
        actor.id,
        "users",
        user_id,
        &snapshot(&before),
        &snapshot(&after),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Replace a user's password material
pub async fn reset_password(
    pool: &SqlitePool,
    actor: &User,
    user_id: i64,
    password: &str,
) -> Result<()> {
    if password.is_empty() {
        return Err(Error::Validation("password must not be empty".to_string()));
    }
    if !authorize(actor, Action::ResetPassword { user_id }) {
        return Err(Error::Authorization(format!(
            "user {} may not reset passwords",
            actor.name
        )));
    }
    let salt = auth::generate_salt();
    let hash = auth::hash_password(password, &salt);

    let mut tx = pool.begin().await?;
    let before = get_in_tx(&mut tx, user_id).await?;

    sqlx::query("UPDATE users SET password_hash = ?, password_salt = ? WHERE id = ?")
        .bind(&hash)
        .bind(&salt)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    // Snapshots never carry password material; record the rotation only
    let mut data1 = snapshot(&before);
    if let Some(obj) = data1.as_object_mut() {
        obj.insert("credentials_rotated".to_string(), json!(true));
    }
    revlog::append(
        &mut tx,
        actor.id,
        "users",
        user_id,
        &snapshot(&before),
        &data1,
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Rename a user's profile.
///
/// Administrators may rename anyone; everyone else only themselves.
pub async fn rename(pool: &SqlitePool, actor: &User, user_id: i64, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("user name must not be empty".to_string()));
    }
    if !authorize(actor, Action::EditProfile { user_id }) {
        return Err(Error::Authorization(format!(
            "user {} may not edit user {}",
            actor.name, user_id
        )));
    }
    let mut tx = pool.begin().await?;
    let before = get_in_tx(&mut tx, user_id).await?;

    sqlx::query("UPDATE users SET name = ? WHERE id = ?")
        .bind(name)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::conflict_on_unique(e, &format!("user name already exists: {}", name)))?;

    let mut after = before.clone();
    after.name = name.to_string();
    revlog::append(
        &mut tx,
        actor.id,
        "users",
        user_id,
        &snapshot(&before),
        &snapshot(&after),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}
