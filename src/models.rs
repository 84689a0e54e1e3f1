use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text profile fields collected at registration. Absent fields are
/// stored as empty strings, not NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub parent_name: String,
    pub dob: String,
    pub class: String,
    pub section: String,
    pub school: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub profile: UserProfile,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub full_name: Option<String>,
    pub parent_name: Option<String>,
    pub dob: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub school: Option<String>,
    pub is_admin: Option<bool>,
    pub created_at: Option<NaiveDateTime>,
    pub last_login: Option<NaiveDateTime>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            password_hash: user.password_hash.unwrap_or_default(),
            profile: UserProfile {
                full_name: user.full_name.unwrap_or_default(),
                parent_name: user.parent_name.unwrap_or_default(),
                dob: user.dob.unwrap_or_default(),
                class: user.class.unwrap_or_default(),
                section: user.section.unwrap_or_default(),
                school: user.school.unwrap_or_default(),
            },
            is_admin: user.is_admin.unwrap_or_default(),
            created_at: user
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            last_login: user
                .last_login
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
        }
    }
}

/// A user's learning progress. The list fields are ordered sequences of
/// opaque content identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Progress {
    pub points: i64,
    pub completed_tutorials: Vec<String>,
    pub completed_challenges: Vec<String>,
    pub emoji_collection: Vec<String>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbProgress {
    pub points: Option<i64>,
    pub completed_tutorials: Option<String>,
    pub completed_challenges: Option<String>,
    pub emoji_collection: Option<String>,
}

impl From<DbProgress> for Progress {
    fn from(db: DbProgress) -> Self {
        Self {
            points: db.points.unwrap_or_default(),
            completed_tutorials: decode_list(db.completed_tutorials),
            completed_challenges: decode_list(db.completed_challenges),
            emoji_collection: decode_list(db.emoji_collection),
        }
    }
}

// Lists live in the database as JSON text; unreadable text degrades to empty.
fn decode_list(raw: Option<String>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

#[derive(Debug, Serialize, Clone)]
pub struct Event {
    pub id: i64,
    pub event_type: String,
    pub event_details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbEvent {
    pub id: Option<i64>,
    pub event_type: Option<String>,
    pub event_details: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
}

impl From<DbEvent> for Event {
    fn from(db: DbEvent) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            event_type: db.event_type.unwrap_or_default(),
            event_details: db.event_details,
            timestamp: db
                .timestamp
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Certificate {
    pub certificate_type: String,
    pub issue_date: DateTime<Utc>,
    pub certificate_code: String,
    pub completed_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCertificate {
    pub certificate_type: Option<String>,
    pub issue_date: Option<NaiveDateTime>,
    pub certificate_code: Option<String>,
    pub completed_date: Option<NaiveDateTime>,
}

impl From<DbCertificate> for Certificate {
    fn from(db: DbCertificate) -> Self {
        Self {
            certificate_type: db.certificate_type.unwrap_or_default(),
            issue_date: db
                .issue_date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            certificate_code: db.certificate_code.unwrap_or_default(),
            completed_date: db
                .completed_date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
            is_completed: db.completed_date.is_some(),
        }
    }
}

/// Certificate joined with its owner, as shown on the public verification
/// page. A code that matches no row yields no snapshot at all.
#[derive(Debug, Serialize, Clone)]
pub struct CertificateVerification {
    pub certificate_type: String,
    pub issue_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub username: String,
    pub profile: UserProfile,
    pub is_completed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbCertificateVerification {
    pub certificate_type: Option<String>,
    pub issue_date: Option<NaiveDateTime>,
    pub completed_date: Option<NaiveDateTime>,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub parent_name: Option<String>,
    pub dob: Option<String>,
    pub class: Option<String>,
    pub section: Option<String>,
    pub school: Option<String>,
}

impl From<DbCertificateVerification> for CertificateVerification {
    fn from(db: DbCertificateVerification) -> Self {
        Self {
            certificate_type: db.certificate_type.unwrap_or_default(),
            issue_date: db
                .issue_date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            completed_date: db
                .completed_date
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc)),
            user_id: db.user_id.unwrap_or_default(),
            username: db.username.unwrap_or_default(),
            profile: UserProfile {
                full_name: db.full_name.unwrap_or_default(),
                parent_name: db.parent_name.unwrap_or_default(),
                dob: db.dob.unwrap_or_default(),
                class: db.class.unwrap_or_default(),
                section: db.section.unwrap_or_default(),
                school: db.school.unwrap_or_default(),
            },
            is_completed: db.completed_date.is_some(),
        }
    }
}
