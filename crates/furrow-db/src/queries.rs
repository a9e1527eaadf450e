use crate::Database;
use crate::models::{MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        display_name: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, display_name, role, password) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, email, display_name, role, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users_by_role(&self, role: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, display_name, role, password, created_at
                 FROM users WHERE role = ?1 ORDER BY display_name",
            )?;
            let rows = stmt
                .query_map([role], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Append one message. A single INSERT, so the id allocation and the
    /// record write land together or not at all.
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
        sent_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_id, recipient_id, content, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, sender_id, recipient_id, content, sent_at),
            )?;
            Ok(())
        })
    }

    pub fn get_message(&self, id: &str) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, content, sent_at, read_at
                 FROM messages WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], message_from_row).optional()?;
            Ok(row)
        })
    }

    /// All messages the user sent or received, in no particular order.
    /// The conversation projector sorts after grouping.
    pub fn get_messages_for_participant(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, content, sent_at, read_at
                 FROM messages WHERE sender_id = ?1 OR recipient_id = ?1",
            )?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Both directions of one participant pair, oldest first.
    pub fn get_messages_between(&self, a: &str, b: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_id, recipient_id, content, sent_at, read_at
                 FROM messages
                 WHERE (sender_id = ?1 AND recipient_id = ?2)
                    OR (sender_id = ?2 AND recipient_id = ?1)
                 ORDER BY sent_at, id",
            )?;
            let rows = stmt
                .query_map([a, b], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn has_thread_between(&self, a: &str, b: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS (
                     SELECT 1 FROM messages
                     WHERE (sender_id = ?1 AND recipient_id = ?2)
                        OR (sender_id = ?2 AND recipient_id = ?1)
                 )",
                [a, b],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Conditional read-receipt update, keyed on `read_at` still being
    /// absent. Returns true if this call performed the transition; false
    /// means another caller already did, which is not an error.
    pub fn mark_message_read(&self, id: &str, read_at: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET read_at = ?1 WHERE id = ?2 AND read_at IS NULL",
                (read_at, id),
            )?;
            Ok(changed == 1)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // column is a compile-time constant, never user input
    let sql = format!(
        "SELECT id, email, display_name, role, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<MessageRow, rusqlite::Error> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        content: row.get(3)?,
        sent_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
