//! SQLite-based storage implementation

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;
use verification_core::{
    next_timestamp, NewLogEntry, OnboardingStatus, Role, VerificationAction,
    VerificationLogEntry,
};

use super::{
    BusinessProfile, FlagChange, NewUser, Profile, Session, SessionId, SessionStore, StoreResult,
    User, UserId, VerificationStore,
};
use crate::error::ApiError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

const USER_COLUMNS: &str = "id, email, password_hash, role, is_verified, created_at";
const LOG_COLUMNS: &str = "id, user_id, action, status, reason, feedback, admin_id, created_at";

/// SQLite-based store implementing both VerificationStore and SessionStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, ApiError> {
        Self::init(Connection::open(path)?)
    }

    /// Private database that lives as long as the store
    pub fn open_in_memory() -> Result<Self, ApiError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ApiError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), ApiError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, ApiError> {
        let table_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        Ok(conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })?)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), ApiError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

            CREATE TABLE IF NOT EXISTS business_profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                company_name TEXT NOT NULL,
                is_verified INTEGER NOT NULL DEFAULT 0,
                verification_date TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                full_name TEXT,
                preferences TEXT NOT NULL DEFAULT '{}'
            );

            CREATE TABLE IF NOT EXISTS contractor_onboarding_status (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                step1 INTEGER NOT NULL DEFAULT 0,
                step2 INTEGER NOT NULL DEFAULT 0,
                step3 INTEGER NOT NULL DEFAULT 0,
                step4 INTEGER NOT NULL DEFAULT 0,
                is_submitted INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL
            );

            -- admin_id carries no foreign key: a missing actor must not block the append
            CREATE TABLE IF NOT EXISTS verification_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                action TEXT NOT NULL,
                status TEXT NOT NULL,
                reason TEXT,
                feedback TEXT,
                admin_id TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_verification_logs_user
                ON verification_logs(user_id, created_at);

            CREATE TRIGGER IF NOT EXISTS verification_logs_no_update
                BEFORE UPDATE ON verification_logs
            BEGIN
                SELECT RAISE(ABORT, 'verification_logs is append-only');
            END;

            CREATE TRIGGER IF NOT EXISTS verification_logs_no_delete
                BEFORE DELETE ON verification_logs
            BEGIN
                SELECT RAISE(ABORT, 'verification_logs is append-only');
            END;

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

// Fixed-width timestamps so TEXT ordering matches time ordering
fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_time(idx, &raw)
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(3)?;
    Ok(User {
        id: UserId(uuid_column(row, 0)?),
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role: role.parse::<Role>().map_err(|e| conversion_error(3, e))?,
        is_verified: row.get(4)?,
        created_at: time_column(row, 5)?,
    })
}

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<VerificationLogEntry> {
    let action: String = row.get(2)?;
    let admin_id: Option<String> = row.get(6)?;
    Ok(VerificationLogEntry {
        id: uuid_column(row, 0)?,
        user_id: uuid_column(row, 1)?,
        action: action
            .parse::<VerificationAction>()
            .map_err(|e| conversion_error(2, e))?,
        status: row.get(3)?,
        reason: row.get(4)?,
        feedback: row.get(5)?,
        admin_id: admin_id
            .map(|raw| Uuid::parse_str(&raw).map_err(|e| conversion_error(6, e)))
            .transpose()?,
        created_at: time_column(row, 7)?,
    })
}

fn user_exists(conn: &Connection, user_id: UserId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![user_id.to_string()],
        |row| row.get(0),
    )
}

impl VerificationStore for SqliteStore {
    fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let user = User {
            id: UserId::new(),
            email: new_user.email.to_lowercase(),
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_verified: false,
            created_at: Utc::now(),
        };
        let id = user.id.to_string();
        let created_at = format_time(user.created_at);

        tx.execute(
            "INSERT INTO users (id, email, password_hash, role, is_verified, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![id, user.email, user.password_hash, user.role.as_str(), created_at],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return ApiError::EmailAlreadyExists;
                }
            }
            ApiError::from(e)
        })?;

        if let (Role::Contractor, Some(company_name)) = (user.role, &new_user.company_name) {
            tx.execute(
                "INSERT INTO business_profiles (user_id, company_name, is_verified, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                params![id, company_name, created_at],
            )?;
        }

        tx.execute(
            "INSERT INTO profiles (user_id, full_name, preferences) VALUES (?1, ?2, '{}')",
            params![id, new_user.full_name],
        )?;

        tx.commit()?;
        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id.to_string()],
                user_from_row,
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email.to_lowercase()],
                user_from_row,
            )
            .optional()?)
    }

    fn list_users(&self, role: Option<Role>) -> StoreResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE ?1 IS NULL OR role = ?1
             ORDER BY created_at DESC, email ASC"
        ))?;
        let users = stmt
            .query_map(params![role.map(|r| r.as_str())], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn get_business_profile(&self, user_id: UserId) -> StoreResult<Option<BusinessProfile>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT company_name, is_verified, verification_date, created_at
                 FROM business_profiles WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    let verification_date: Option<String> = row.get(2)?;
                    Ok(BusinessProfile {
                        user_id,
                        company_name: row.get(0)?,
                        is_verified: row.get(1)?,
                        verification_date: verification_date
                            .map(|raw| parse_time(2, &raw))
                            .transpose()?,
                        created_at: time_column(row, 3)?,
                    })
                },
            )
            .optional()?)
    }

    fn get_profile(&self, user_id: UserId) -> StoreResult<Option<Profile>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT full_name, preferences FROM profiles WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    let preferences: String = row.get(1)?;
                    Ok(Profile {
                        user_id,
                        full_name: row.get(0)?,
                        preferences: serde_json::from_str(&preferences)
                            .map_err(|e| conversion_error(1, e))?,
                    })
                },
            )
            .optional()?)
    }

    fn set_onboarding_completed(&self, user_id: UserId, completed: bool) -> StoreResult<()> {
        let mut profile = self
            .get_profile(user_id)?
            .unwrap_or_else(|| Profile::new(user_id, None));
        profile.set_onboarding_completed(completed);

        let conn = self.conn()?;
        if !user_exists(&conn, user_id)? {
            return Err(ApiError::UserNotFound);
        }
        conn.execute(
            "INSERT INTO profiles (user_id, full_name, preferences) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET preferences = excluded.preferences",
            params![
                user_id.to_string(),
                profile.full_name,
                profile.preferences.to_string()
            ],
        )?;
        Ok(())
    }

    fn get_onboarding(&self, user_id: UserId) -> StoreResult<Option<OnboardingStatus>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT step1, step2, step3, step4, is_submitted, updated_at
                 FROM contractor_onboarding_status WHERE user_id = ?1",
                params![user_id.to_string()],
                |row| {
                    Ok(OnboardingStatus {
                        user_id: user_id.0,
                        step1: row.get(0)?,
                        step2: row.get(1)?,
                        step3: row.get(2)?,
                        step4: row.get(3)?,
                        is_submitted: row.get(4)?,
                        updated_at: time_column(row, 5)?,
                    })
                },
            )
            .optional()?)
    }

    fn upsert_onboarding(&self, status: &OnboardingStatus) -> StoreResult<()> {
        let conn = self.conn()?;
        if !user_exists(&conn, UserId(status.user_id))? {
            return Err(ApiError::UserNotFound);
        }
        conn.execute(
            "INSERT INTO contractor_onboarding_status
                (user_id, step1, step2, step3, step4, is_submitted, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                step1 = excluded.step1,
                step2 = excluded.step2,
                step3 = excluded.step3,
                step4 = excluded.step4,
                is_submitted = excluded.is_submitted,
                updated_at = excluded.updated_at",
            params![
                status.user_id.to_string(),
                status.step1,
                status.step2,
                status.step3,
                status.step4,
                status.is_submitted,
                format_time(status.updated_at),
            ],
        )?;
        Ok(())
    }

    fn list_verification_logs(&self, user_id: UserId) -> StoreResult<Vec<VerificationLogEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM verification_logs
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let entries = stmt
            .query_map(params![user_id.to_string()], log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn apply_verification_action(
        &self,
        flags: FlagChange,
        entry: NewLogEntry,
    ) -> StoreResult<VerificationLogEntry> {
        let user_id = UserId(entry.user_id);
        let id = user_id.to_string();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if !user_exists(&tx, user_id)? {
            return Err(ApiError::UserNotFound);
        }

        let latest: Option<String> = tx.query_row(
            "SELECT MAX(created_at) FROM verification_logs WHERE user_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        let latest = latest.map(|raw| parse_time(0, &raw)).transpose()?;
        let entry = entry.into_entry(next_timestamp(Utc::now(), latest));
        let created_at = format_time(entry.created_at);

        if let Some(verified) = flags.user_verified {
            tx.execute(
                "UPDATE users SET is_verified = ?1 WHERE id = ?2",
                params![verified, id],
            )?;
        }
        if let Some(verified) = flags.business_verified {
            tx.execute(
                "UPDATE business_profiles SET is_verified = ?1, verification_date = ?2
                 WHERE user_id = ?3",
                params![verified, verified.then(|| created_at.clone()), id],
            )?;
        }

        tx.execute(
            &format!(
                "INSERT INTO verification_logs ({LOG_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                entry.id.to_string(),
                id,
                entry.action.as_str(),
                entry.status,
                entry.reason,
                entry.feedback,
                entry.admin_id.map(|a| a.to_string()),
                created_at,
            ],
        )?;

        tx.commit()?;
        Ok(entry)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let conn = self.conn()?;
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.id.0,
                session.user_id.to_string(),
                format_time(session.created_at),
            ],
        )?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;
        Ok(conn
            .query_row(
                "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    Ok(Session {
                        id: SessionId(row.get(0)?),
                        user_id: UserId(uuid_column(row, 1)?),
                        created_at: time_column(row, 2)?,
                    })
                },
            )
            .optional()?)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])?;
        Ok(())
    }
}
