//! Repository functions for local accounts and sessions.
//!
//! Function-based, one call per statement, over a borrowed connection.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

// ═══════════════════════════════════════════════════════════
// Accounts
// ═══════════════════════════════════════════════════════════

/// A row from the `accounts` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub salt: Vec<u8>,
    pub password_hash: Vec<u8>,
    pub created_at: String,
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        user_id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        salt: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a new account. A duplicate email is a constraint violation.
pub fn insert_account(conn: &Connection, account: &AccountRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO accounts (user_id, email, display_name, salt, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account.user_id,
            account.email,
            account.display_name,
            account.salt,
            account.password_hash,
            account.created_at,
        ],
    )?;
    Ok(())
}

/// Get an account by its normalized email.
pub fn get_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<AccountRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT user_id, email, display_name, salt, password_hash, created_at
             FROM accounts WHERE email = ?1",
            params![email],
            account_from_row,
        )
        .optional()?;
    Ok(row)
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

/// A row from the `sessions` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub token_hash: Vec<u8>,
    pub user_id: String,
    /// Unix epoch milliseconds.
    pub expires_at: i64,
}

pub fn insert_session(conn: &Connection, session: &SessionRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![session.token_hash, session.user_id, session.expires_at],
    )?;
    Ok(())
}

/// Delete sessions that expired at or before `now_ms`. Returns the count removed.
pub fn delete_expired_sessions(conn: &Connection, now_ms: i64) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![now_ms],
    )?;
    Ok(removed)
}

/// Resolve a token hash to its account and expiry in one lookup.
pub fn get_session_account(
    conn: &Connection,
    token_hash: &[u8],
) -> Result<Option<(AccountRow, i64)>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT a.user_id, a.email, a.display_name, a.salt, a.password_hash, a.created_at,
                    s.expires_at
             FROM sessions s JOIN accounts a ON a.user_id = s.user_id
             WHERE s.token_hash = ?1",
            params![token_hash],
            |row| Ok((account_from_row(row)?, row.get::<_, i64>(6)?)),
        )
        .optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn account(id: &str, email: &str) -> AccountRow {
        AccountRow {
            user_id: id.into(),
            email: email.into(),
            display_name: Some("Ann".into()),
            salt: vec![1; 16],
            password_hash: vec![2; 32],
            created_at: "2026-03-01T12:00:00Z".into(),
        }
    }

    #[test]
    fn insert_and_get_account() {
        let conn = open_memory_database().unwrap();
        let row = account("u1", "ann@example.com");
        insert_account(&conn, &row).unwrap();
        assert_eq!(get_account_by_email(&conn, "ann@example.com").unwrap(), Some(row));
        assert_eq!(get_account_by_email(&conn, "bob@example.com").unwrap(), None);
    }

    #[test]
    fn duplicate_email_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &account("u1", "ann@example.com")).unwrap();
        let err = insert_account(&conn, &account("u2", "ann@example.com")).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn session_resolves_to_account() {
        let conn = open_memory_database().unwrap();
        let row = account("u1", "ann@example.com");
        insert_account(&conn, &row).unwrap();
        insert_session(
            &conn,
            &SessionRow {
                token_hash: vec![9; 32],
                user_id: "u1".into(),
                expires_at: 5_000,
            },
        )
        .unwrap();

        assert_eq!(get_session_account(&conn, &[9; 32]).unwrap(), Some((row, 5_000)));
        assert_eq!(get_session_account(&conn, &[8; 32]).unwrap(), None);
    }

    #[test]
    fn expired_sessions_are_deleted() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &account("u1", "ann@example.com")).unwrap();
        for (hash, expires_at) in [(1u8, 100), (2, 200), (3, 300)] {
            insert_session(
                &conn,
                &SessionRow {
                    token_hash: vec![hash; 32],
                    user_id: "u1".into(),
                    expires_at,
                },
            )
            .unwrap();
        }
        assert_eq!(delete_expired_sessions(&conn, 200).unwrap(), 2);
        assert!(get_session_account(&conn, &[3; 32]).unwrap().is_some());
    }
}
