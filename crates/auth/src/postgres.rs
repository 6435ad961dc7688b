use super::*;
use march_core::ID;
use march_core::Unique;
use std::sync::Arc;
use tokio_postgres::Client;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for registered members and their credential hashes.
pub const USERS: &str = "users";

const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

const COLUMNS: &str = "id, username, full_name, COALESCE(email, ''), role, hashword, created_at, updated_at";

/// Establishes a database connection and spawns its driver task.
pub async fn db(url: &str) -> Result<Arc<Client>, PgErr> {
    log::info!("connecting to database");
    let (client, connection) = tokio_postgres::connect(url, tokio_postgres::NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed: {}", e);
        }
    });
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await?;
    Ok(Arc::new(client))
}

const SCHEMA: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    USERS,
    " (
        id          UUID PRIMARY KEY,
        username    TEXT NOT NULL CONSTRAINT ",
    USERNAME_KEY,
    " UNIQUE,
        full_name   TEXT NOT NULL DEFAULT '',
        email       TEXT CONSTRAINT ",
    EMAIL_KEY,
    " UNIQUE,
        role        TEXT NOT NULL CHECK (role IN ('admin', 'general')),
        hashword    TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    );"
);

/// Creates the users table if it does not exist.
pub async fn migrate(client: &Client) -> Result<(), PgErr> {
    client.batch_execute(SCHEMA).await
}

/// Field a violated unique constraint guards, if it is one users may collide on.
fn conflict(constraint: Option<&str>) -> Option<&'static str> {
    match constraint {
        Some(USERNAME_KEY) => Some("username"),
        Some(EMAIL_KEY) => Some("email"),
        _ => None,
    }
}

impl From<PgErr> for StoreError {
    fn from(e: PgErr) -> Self {
        let field = match e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            true => conflict(e.as_db_error().and_then(|d| d.constraint())),
            false => None,
        };
        match field {
            Some(field) => Self::Conflict(field),
            None => {
                log::error!("database error: {}", e);
                Self::Backend(e.to_string())
            }
        }
    }
}

fn account(row: &Row) -> Result<(Member, String), StoreError> {
    let role = row
        .get::<_, String>(4)
        .parse::<Role>()
        .map_err(StoreError::Backend)?;
    let member = Member::hydrate(
        ID::from(row.get::<_, uuid::Uuid>(0)),
        row.get(1),
        row.get(2),
        row.get(3),
        role,
        row.get(6),
        row.get(7),
    );
    Ok((member, row.get(5)))
}

impl Directory for Arc<Client> {
    async fn find(&self, id: ID<Member>) -> Result<Option<(Member, String)>, StoreError> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", USERS, " WHERE id = $1"),
            &[&id.inner()],
        )
        .await?
        .as_ref()
        .map(account)
        .transpose()
    }

    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, StoreError> {
        self.query_opt(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", USERS, " WHERE username = $1"),
            &[&username],
        )
        .await?
        .as_ref()
        .map(account)
        .transpose()
    }

    async fn list(&self) -> Result<Vec<Member>, StoreError> {
        self.query(
            const_format::concatcp!("SELECT ", COLUMNS, " FROM ", USERS, " ORDER BY created_at, id"),
            &[],
        )
        .await?
        .iter()
        .map(|row| account(row).map(|(member, _)| member))
        .collect()
    }

    async fn create(&self, member: &Member, hashword: &str) -> Result<(), StoreError> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                USERS,
                " (id, username, full_name, email, role, hashword, created_at, updated_at)
                 VALUES ($1, $2, $3, NULLIF($4, ''), $5, $6, $7, $8)"
            ),
            &[
                &member.id().inner(),
                &member.username(),
                &member.full_name(),
                &member.email(),
                &member.role().as_str(),
                &hashword,
                &member.created_at(),
                &member.updated_at(),
            ],
        )
        .await
        .map(|_| ())
        .map_err(StoreError::from)
    }

    async fn update(&self, member: &Member, hashword: Option<&str>) -> Result<(), StoreError> {
        let rows = self
            .execute(
                const_format::concatcp!(
                    "UPDATE ",
                    USERS,
                    " SET username = $2, full_name = $3, email = NULLIF($4, ''), role = $5,
                          updated_at = $6, hashword = COALESCE($7, hashword)
                      WHERE id = $1"
                ),
                &[
                    &member.id().inner(),
                    &member.username(),
                    &member.full_name(),
                    &member.email(),
                    &member.role().as_str(),
                    &member.updated_at(),
                    &hashword,
                ],
            )
            .await?;
        match rows {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }

    async fn delete(&self, id: ID<Member>) -> Result<(), StoreError> {
        let rows = self
            .execute(
                const_format::concatcp!("DELETE FROM ", USERS, " WHERE id = $1"),
                &[&id.inner()],
            )
            .await?;
        match rows {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn only_named_keys_are_conflicts() {
        assert_eq!(conflict(Some("users_username_key")), Some("username"));
        assert_eq!(conflict(Some("users_email_key")), Some("email"));
        assert_eq!(conflict(Some("users_pkey")), None);
        assert_eq!(conflict(Some("users_email_lower_idx")), None);
        assert_eq!(conflict(None), None);
    }
    #[test]
    fn schema_names_its_keys() {
        assert!(SCHEMA.contains("CONSTRAINT users_username_key UNIQUE"));
        assert!(SCHEMA.contains("CONSTRAINT users_email_key UNIQUE"));
        assert!(SCHEMA.contains("id          UUID PRIMARY KEY"));
    }
}
