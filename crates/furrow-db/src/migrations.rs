use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            display_name    TEXT NOT NULL,
            role            TEXT NOT NULL CHECK (role IN ('admin', 'grower', 'customer')),
            password        TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Append-only: rows are never updated after insert, except the
        -- single read_at transition (NULL -> timestamp, exactly once).
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            recipient_id    TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            sent_at         TEXT NOT NULL,
            read_at         TEXT,
            CHECK (sender_id <> recipient_id)
        );

        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id, sent_at);

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id, sent_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
