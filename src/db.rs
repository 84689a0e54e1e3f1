use std::str::FromStr;

use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::StoreError;
use crate::migrations::run_migrations;
use crate::models::{
    Certificate, CertificateVerification, DbCertificate, DbCertificateVerification, DbEvent,
    DbProgress, DbUser, Event, Progress, User, UserProfile,
};
use crate::schema::CURRENT_SCHEMA;

pub const DEFAULT_EVENT_LIMIT: i64 = 50;

/// Open a pool over the database file, creating the file on first use.
#[instrument]
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, StoreError> {
    info!("Opening SQLite pool");
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Apply the schema and run startup migrations. Safe to call on every
/// process start.
#[instrument(skip(pool))]
pub async fn initialize_database(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    info!("Initializing database schema");
    sqlx::raw_sql(CURRENT_SCHEMA).execute(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

/// Create a user together with its empty progress row. The two inserts share
/// one transaction, so a failed progress insert rolls the user back too.
/// A taken username surfaces as [`StoreError::Conflict`].
#[instrument(skip(pool, password_hash, profile))]
pub async fn add_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password_hash: &str,
    profile: Option<&UserProfile>,
    is_admin: bool,
) -> Result<i64, StoreError> {
    info!("Creating new user");

    let profile = profile.cloned().unwrap_or_default();

    let mut tx = pool.begin().await?;

    let res = match sqlx::query(
        "INSERT INTO users (
             username, password_hash, full_name, parent_name,
             dob, class, section, school, is_admin
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(&profile.full_name)
    .bind(&profile.parent_name)
    .bind(&profile.dob)
    .bind(&profile.class)
    .bind(&profile.section)
    .bind(&profile.school)
    .bind(is_admin)
    .execute(&mut *tx)
    .await
    {
        Ok(res) => res,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(StoreError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let user_id = res.last_insert_rowid();

    sqlx::query("INSERT INTO user_progress (user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    log_event(
        pool,
        user_id,
        "user_created",
        Some(&format!("User account created for {}", username)),
    )
    .await;

    Ok(user_id)
}

#[instrument(skip(pool))]
pub async fn get_user(pool: &Pool<Sqlite>, username: &str) -> Result<Option<User>, StoreError> {
    info!("Fetching user by username");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, password_hash, full_name, parent_name,
                dob, class, section, school, is_admin, created_at, last_login
         FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

#[instrument(skip(pool))]
pub async fn get_user_by_id(pool: &Pool<Sqlite>, user_id: i64) -> Result<Option<User>, StoreError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, password_hash, full_name, parent_name,
                dob, class, section, school, is_admin, created_at, last_login
         FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(User::from))
}

#[instrument(skip(pool))]
pub async fn update_last_login(pool: &Pool<Sqlite>, user_id: i64) -> Result<(), StoreError> {
    info!("Updating last login timestamp");
    sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Overwrite all profile fields. Fields the caller left out arrive here as
/// empty strings and are stored that way.
#[instrument(skip(pool, profile))]
pub async fn update_user_profile(
    pool: &Pool<Sqlite>,
    user_id: i64,
    profile: &UserProfile,
) -> Result<(), StoreError> {
    info!("Updating user profile");
    sqlx::query(
        "UPDATE users
         SET full_name = ?, parent_name = ?, dob = ?,
             class = ?, section = ?, school = ?
         WHERE id = ?",
    )
    .bind(&profile.full_name)
    .bind(&profile.parent_name)
    .bind(&profile.dob)
    .bind(&profile.class)
    .bind(&profile.section)
    .bind(&profile.school)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn set_admin_status(
    pool: &Pool<Sqlite>,
    user_id: i64,
    is_admin: bool,
) -> Result<(), StoreError> {
    info!("Setting admin status");
    sqlx::query("UPDATE users SET is_admin = ? WHERE id = ?")
        .bind(is_admin)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip_all, fields(user_id))]
pub async fn reset_user_password(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new_password_hash: &str,
) -> Result<(), StoreError> {
    info!("Resetting user password");
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(new_password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    log_event(
        pool,
        user_id,
        "password_reset",
        Some("Password was reset by administrator"),
    )
    .await;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_all_users(pool: &Pool<Sqlite>) -> Result<Vec<User>, StoreError> {
    info!("Fetching all users");
    let rows = sqlx::query_as::<_, DbUser>(
        "SELECT id, username, password_hash, full_name, parent_name,
                dob, class, section, school, is_admin, created_at, last_login
         FROM users
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// A user without a progress row reads as zero progress rather than an
/// error, so callers never special-case brand-new accounts.
#[instrument(skip(pool))]
pub async fn get_user_progress(pool: &Pool<Sqlite>, user_id: i64) -> Result<Progress, StoreError> {
    info!("Fetching user progress");
    let row = sqlx::query_as::<_, DbProgress>(
        "SELECT points, completed_tutorials, completed_challenges, emoji_collection
         FROM user_progress WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Progress::from).unwrap_or_default())
}

/// Full overwrite of the progress row, not a merge.
#[instrument(skip(pool, completed_tutorials, completed_challenges, emoji_collection))]
pub async fn update_user_progress(
    pool: &Pool<Sqlite>,
    user_id: i64,
    points: i64,
    completed_tutorials: &[String],
    completed_challenges: &[String],
    emoji_collection: &[String],
) -> Result<(), StoreError> {
    info!("Updating user progress");
    let tutorials = serde_json::to_string(completed_tutorials)?;
    let challenges = serde_json::to_string(completed_challenges)?;
    let emojis = serde_json::to_string(emoji_collection)?;

    let res = sqlx::query(
        "UPDATE user_progress
         SET points = ?,
             completed_tutorials = ?,
             completed_challenges = ?,
             emoji_collection = ?,
             last_updated = CURRENT_TIMESTAMP
         WHERE user_id = ?",
    )
    .bind(points)
    .bind(tutorials)
    .bind(challenges)
    .bind(emojis)
    .bind(user_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!(
            "No progress row for user id {}",
            user_id
        )));
    }

    Ok(())
}

/// Best-effort append to the activity log. Insert failures are logged and
/// swallowed; a lost event must never fail the operation it annotates.
#[instrument(skip(pool))]
pub async fn log_event(
    pool: &Pool<Sqlite>,
    user_id: i64,
    event_type: &str,
    event_details: Option<&str>,
) {
    if let Err(e) = insert_event(pool, user_id, event_type, event_details).await {
        e.log(&format!("Recording '{}' activity event", event_type));
    }
}

async fn insert_event(
    pool: &Pool<Sqlite>,
    user_id: i64,
    event_type: &str,
    event_details: Option<&str>,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO user_events (user_id, event_type, event_details) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(event_type)
        .bind(event_details)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_user_events(
    pool: &Pool<Sqlite>,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Event>, StoreError> {
    info!("Fetching recent user events");
    let rows = sqlx::query_as::<_, DbEvent>(
        "SELECT id, event_type, event_details, timestamp
         FROM user_events
         WHERE user_id = ?
         ORDER BY timestamp DESC, id DESC
         LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Event::from).collect())
}

/// Issue a certificate and hand back its verification code.
#[instrument(skip(pool))]
pub async fn create_certificate(
    pool: &Pool<Sqlite>,
    user_id: i64,
    certificate_type: &str,
) -> Result<String, StoreError> {
    info!("Creating certificate");
    let certificate_code = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO certificates (user_id, certificate_type, certificate_code) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(certificate_type)
    .bind(&certificate_code)
    .execute(pool)
    .await?;

    log_event(
        pool,
        user_id,
        "certificate_created",
        Some(&format!(
            "Certificate of type '{}' created with code {}",
            certificate_type, certificate_code
        )),
    )
    .await;

    Ok(certificate_code)
}

/// Mark a certificate as completed. A code that matches no certificate is
/// reported as [`StoreError::NotFound`].
#[instrument(skip(pool, certificate_code))]
pub async fn complete_certificate(
    pool: &Pool<Sqlite>,
    certificate_code: &str,
) -> Result<(), StoreError> {
    info!("Completing certificate");
    let row = sqlx::query(
        "SELECT user_id, certificate_type FROM certificates WHERE certificate_code = ?",
    )
    .bind(certificate_code)
    .fetch_optional(pool)
    .await?;

    let (user_id, certificate_type) = match row {
        Some(row) => (row.get::<i64, _>(0), row.get::<String, _>(1)),
        _ => {
            return Err(StoreError::NotFound(format!(
                "No certificate matches code {}",
                certificate_code
            )));
        }
    };

    sqlx::query(
        "UPDATE certificates SET completed_date = CURRENT_TIMESTAMP WHERE certificate_code = ?",
    )
    .bind(certificate_code)
    .execute(pool)
    .await?;

    log_event(
        pool,
        user_id,
        "certificate_completed",
        Some(&format!(
            "Certificate of type '{}' with code {} completed",
            certificate_type, certificate_code
        )),
    )
    .await;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_user_certificates(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<Certificate>, StoreError> {
    info!("Fetching user certificates");
    let rows = sqlx::query_as::<_, DbCertificate>(
        "SELECT certificate_type, issue_date, certificate_code, completed_date
         FROM certificates
         WHERE user_id = ?
         ORDER BY issue_date DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Certificate::from).collect())
}

/// Resolve a verification code to the certificate and its owner. `Ok(None)`
/// means the code is not valid.
#[instrument(skip(pool, certificate_code))]
pub async fn verify_certificate(
    pool: &Pool<Sqlite>,
    certificate_code: &str,
) -> Result<Option<CertificateVerification>, StoreError> {
    info!("Verifying certificate");
    let row = sqlx::query_as::<_, DbCertificateVerification>(
        "SELECT c.certificate_type, c.issue_date, c.completed_date, u.id AS user_id,
                u.username, u.full_name, u.parent_name, u.dob, u.class, u.section, u.school
         FROM certificates c
         JOIN users u ON c.user_id = u.id
         WHERE c.certificate_code = ?",
    )
    .bind(certificate_code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CertificateVerification::from))
}
