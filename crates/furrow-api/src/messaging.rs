//! The messaging operations behind the HTTP handlers.
//!
//! Everything here is synchronous and blocking (rusqlite underneath); the
//! handlers in `messages.rs` run these on the blocking pool. Keeping the
//! operations free of axum types also lets the integration suite drive
//! them directly against an in-memory database.

use anyhow::{Context, anyhow};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use tracing::warn;
use uuid::Uuid;

use furrow_db::Database;
use furrow_db::models::{MessageRow, UserRow};
use furrow_types::models::{Conversation, ConversationThread, Message, Role, UserProfile};

use crate::contacts;
use crate::error::ApiError;
use crate::projector;

/// Append a message from `caller` to `recipient_id`.
///
/// The contact resolver is consulted only when the pair has no message
/// history yet; an existing thread may always be continued.
pub fn send(
    db: &Database,
    caller: Uuid,
    recipient_id: Uuid,
    content: &str,
    sent_at: Option<DateTime<Utc>>,
) -> Result<Message, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("message content must not be empty".into()));
    }
    if recipient_id == caller {
        return Err(ApiError::Validation("cannot send a message to yourself".into()));
    }

    let sender = require_user(db, caller)?;
    let recipient = require_user(db, recipient_id)?;

    let existing = db.has_thread_between(&caller.to_string(), &recipient_id.to_string())?;
    if !existing && !contacts::may_initiate(sender.role, recipient.role) {
        return Err(ApiError::Forbidden(format!(
            "a {} may not start a conversation with a {}",
            sender.role, recipient.role
        )));
    }

    let id = Uuid::new_v4();
    // Truncate to the precision the store keeps, so the send response and
    // every later read agree on sent_at.
    let sent_at = sent_at.unwrap_or_else(Utc::now).trunc_subsecs(6);
    db.insert_message(
        &id.to_string(),
        &caller.to_string(),
        &recipient_id.to_string(),
        content,
        &encode_time(sent_at),
    )?;

    Ok(Message {
        id,
        sender_id: caller,
        recipient_id,
        content: content.to_string(),
        sent_at,
        read_at: None,
    })
}

/// Set the read receipt on a message. Only the recipient may do this, and
/// repeating the call is a success no-op: the conditional update in the
/// store guarantees the original timestamp survives any race.
pub fn mark_read(db: &Database, caller: Uuid, message_id: Uuid) -> Result<(), ApiError> {
    let row = db
        .get_message(&message_id.to_string())?
        .ok_or_else(|| ApiError::NotFound(format!("no message {}", message_id)))?;

    if row.recipient_id != caller.to_string() {
        return Err(ApiError::Unauthorized(
            "only the recipient may mark a message as read".into(),
        ));
    }

    // false here means the receipt was already set; callers see success
    // either way.
    db.mark_message_read(&message_id.to_string(), &encode_time(Utc::now()))?;
    Ok(())
}

/// The viewer's conversation list: one entry per counterparty, newest
/// activity first, enriched with the counterparty's current profile.
pub fn list_conversations(db: &Database, caller: Uuid) -> Result<Vec<Conversation>, ApiError> {
    let rows = db.get_messages_for_participant(&caller.to_string())?;
    let messages = rows
        .into_iter()
        .map(message_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let summaries = projector::project(caller, &messages);

    let mut conversations = Vec::with_capacity(summaries.len());
    for summary in summaries {
        // Profile lookup happens at read time so renames show up
        // immediately. Foreign keys keep participants resolvable; a miss
        // would mean the store and directory disagree.
        let Some(row) = db.get_user_by_id(&summary.counterparty_id.to_string())? else {
            warn!("message participant {} missing from user directory", summary.counterparty_id);
            continue;
        };
        conversations.push(Conversation {
            counterparty: profile_from_row(&row)?,
            last_message: summary.last_message,
            unread_count: summary.unread_count,
            last_message_from_viewer: summary.last_message_from_viewer,
        });
    }

    Ok(conversations)
}

/// The full thread between the caller and one other user, oldest first.
/// No shared history is a valid empty state, not an error.
pub fn get_conversation(
    db: &Database,
    caller: Uuid,
    other_user_id: Uuid,
) -> Result<ConversationThread, ApiError> {
    if other_user_id == caller {
        return Err(ApiError::Validation("cannot open a conversation with yourself".into()));
    }

    let counterparty = require_user(db, other_user_id)?;

    let rows = db.get_messages_between(&caller.to_string(), &other_user_id.to_string())?;
    let mut messages = rows
        .into_iter()
        .map(message_from_row)
        .collect::<anyhow::Result<Vec<_>>>()?;
    projector::sort_thread(&mut messages);

    Ok(ConversationThread {
        counterparty,
        messages,
    })
}

fn require_user(db: &Database, id: Uuid) -> Result<UserProfile, ApiError> {
    let row = db
        .get_user_by_id(&id.to_string())?
        .ok_or_else(|| ApiError::NotFound(format!("no user {}", id)))?;
    Ok(profile_from_row(&row)?)
}

fn profile_from_row(row: &UserRow) -> anyhow::Result<UserProfile> {
    Ok(UserProfile {
        id: row.id.parse().with_context(|| format!("corrupt user id '{}'", row.id))?,
        role: Role::parse(&row.role)
            .ok_or_else(|| anyhow!("corrupt role '{}' for user '{}'", row.role, row.id))?,
        display_name: row.display_name.clone(),
    })
}

fn message_from_row(row: MessageRow) -> anyhow::Result<Message> {
    Ok(Message {
        id: row.id.parse().with_context(|| format!("corrupt message id '{}'", row.id))?,
        sender_id: row
            .sender_id
            .parse()
            .with_context(|| format!("corrupt sender_id on message '{}'", row.id))?,
        recipient_id: row
            .recipient_id
            .parse()
            .with_context(|| format!("corrupt recipient_id on message '{}'", row.id))?,
        content: row.content,
        sent_at: decode_time(&row.sent_at)
            .with_context(|| format!("corrupt sent_at on message '{}'", row.id))?,
        read_at: row
            .read_at
            .as_deref()
            .map(decode_time)
            .transpose()
            .with_context(|| format!("corrupt read_at on message '{}'", row.id))?,
    })
}

/// Fixed-width UTC timestamps, so the TEXT column sorts chronologically.
fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(s: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}
