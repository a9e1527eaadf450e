//! End-to-end exercises of the messaging operations against an in-memory
//! database, driving the same functions the HTTP handlers delegate to.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use furrow_api::error::ApiError;
use furrow_api::messaging;
use furrow_db::Database;
use furrow_types::models::Role;

struct Fixture {
    db: Database,
    admin: Uuid,
    grower: Uuid,
    customer: Uuid,
    customer2: Uuid,
}

fn fixture() -> Fixture {
    let db = Database::open_in_memory().unwrap();
    let admin = add_user(&db, "ada", Role::Admin);
    let grower = add_user(&db, "gil", Role::Grower);
    let customer = add_user(&db, "cam", Role::Customer);
    let customer2 = add_user(&db, "casey", Role::Customer);
    Fixture { db, admin, grower, customer, customer2 }
}

fn add_user(db: &Database, name: &str, role: Role) -> Uuid {
    let id = Uuid::new_v4();
    db.create_user(
        &id.to_string(),
        &format!("{}@example.com", name),
        name,
        role.as_str(),
        "not-a-real-hash",
    )
    .unwrap();
    id
}

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 9, minute, 0).unwrap()
}

#[test]
fn send_rejects_empty_and_whitespace_content() {
    let f = fixture();
    for content in ["", "   ", "\n\t"] {
        let err = messaging::send(&f.db, f.customer, f.grower, content, None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)), "content {:?}", content);
    }
}

#[test]
fn send_rejects_self_addressed_message() {
    let f = fixture();
    let err = messaging::send(&f.db, f.customer, f.customer, "hi me", None).unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test]
fn send_to_unknown_user_is_not_found() {
    let f = fixture();
    let err = messaging::send(&f.db, f.customer, Uuid::new_v4(), "anyone there?", None).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn customer_cannot_start_conversation_with_customer() {
    let f = fixture();
    let err = messaging::send(&f.db, f.customer, f.customer2, "psst", None).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // But grower and admin are fine as first contacts.
    messaging::send(&f.db, f.customer, f.grower, "do you have kale?", None).unwrap();
    messaging::send(&f.db, f.customer, f.admin, "help please", None).unwrap();
}

#[test]
fn existing_thread_overrides_role_gating() {
    let f = fixture();

    // Grower cannot approach a customer cold.
    let err = messaging::send(&f.db, f.grower, f.customer, "buy my kale", None).unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // Once the customer reaches out, the grower may reply freely.
    messaging::send(&f.db, f.customer, f.grower, "do you have kale?", Some(at(0))).unwrap();
    messaging::send(&f.db, f.grower, f.customer, "picked this morning", Some(at(1))).unwrap();

    let thread = messaging::get_conversation(&f.db, f.customer, f.grower).unwrap();
    assert_eq!(thread.messages.len(), 2);
}

#[test]
fn thread_is_symmetric_between_participants() {
    let f = fixture();
    messaging::send(&f.db, f.customer, f.grower, "one", Some(at(0))).unwrap();
    messaging::send(&f.db, f.grower, f.customer, "two", Some(at(1))).unwrap();
    messaging::send(&f.db, f.customer, f.grower, "three", Some(at(2))).unwrap();

    let mine = messaging::get_conversation(&f.db, f.customer, f.grower).unwrap();
    let theirs = messaging::get_conversation(&f.db, f.grower, f.customer).unwrap();

    let my_ids: Vec<Uuid> = mine.messages.iter().map(|m| m.id).collect();
    let their_ids: Vec<Uuid> = theirs.messages.iter().map(|m| m.id).collect();
    assert_eq!(my_ids, their_ids);
    assert_eq!(
        mine.messages.iter().map(|m| &m.content).collect::<Vec<_>>(),
        vec!["one", "two", "three"]
    );
}

#[test]
fn empty_history_is_a_valid_empty_thread() {
    let f = fixture();
    let thread = messaging::get_conversation(&f.db, f.customer, f.grower).unwrap();
    assert!(thread.messages.is_empty());
    assert_eq!(thread.counterparty.id, f.grower);

    // Unknown counterparty is the one case that errors.
    let err = messaging::get_conversation(&f.db, f.customer, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn send_response_agrees_with_stored_message() {
    let f = fixture();
    // Server-assigned time: the response must carry exactly what the store
    // will return on every later read, not a higher-precision clock value.
    let sent = messaging::send(&f.db, f.customer, f.grower, "fresh eggs?", None).unwrap();

    let thread = messaging::get_conversation(&f.db, f.customer, f.grower).unwrap();
    assert_eq!(thread.messages[0].id, sent.id);
    assert_eq!(thread.messages[0].sent_at, sent.sent_at);
    assert_eq!(thread.messages[0].content, sent.content);
}

#[test]
fn viewer_with_no_messages_sees_empty_conversation_list() {
    let f = fixture();
    assert!(messaging::list_conversations(&f.db, f.customer).unwrap().is_empty());
}

#[test]
fn unread_count_tracks_send_and_mark_read() {
    let f = fixture();
    messaging::send(&f.db, f.customer, f.grower, "first", Some(at(0))).unwrap();

    // Nothing unread for the sender.
    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    assert_eq!(list[0].unread_count, 0);

    // Each incoming message increments by exactly one.
    let reply = messaging::send(&f.db, f.grower, f.customer, "second", Some(at(1))).unwrap();
    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    assert_eq!(list[0].unread_count, 1);

    messaging::send(&f.db, f.grower, f.customer, "third", Some(at(2))).unwrap();
    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    assert_eq!(list[0].unread_count, 2);

    // Marking one read decrements by exactly one.
    messaging::mark_read(&f.db, f.customer, reply.id).unwrap();
    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    assert_eq!(list[0].unread_count, 1);
}

#[test]
fn mark_read_is_idempotent_and_keeps_first_timestamp() {
    let f = fixture();
    let msg = messaging::send(&f.db, f.customer, f.grower, "hi", Some(at(0))).unwrap();

    messaging::mark_read(&f.db, f.grower, msg.id).unwrap();
    let first = messaging::get_conversation(&f.db, f.grower, f.customer).unwrap().messages[0]
        .read_at
        .expect("read receipt set");

    // Second call succeeds and changes nothing.
    messaging::mark_read(&f.db, f.grower, msg.id).unwrap();
    let second = messaging::get_conversation(&f.db, f.grower, f.customer).unwrap().messages[0]
        .read_at
        .expect("read receipt still set");
    assert_eq!(first, second);
}

#[test]
fn only_the_recipient_may_mark_read() {
    let f = fixture();
    let msg = messaging::send(&f.db, f.customer, f.grower, "hi", Some(at(0))).unwrap();

    let err = messaging::mark_read(&f.db, f.customer, msg.id).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    let err = messaging::mark_read(&f.db, f.admin, msg.id).unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));

    let err = messaging::mark_read(&f.db, f.grower, Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn conversation_list_orders_by_latest_activity() {
    let f = fixture();
    messaging::send(&f.db, f.customer, f.grower, "to grower", Some(at(0))).unwrap();
    messaging::send(&f.db, f.customer, f.admin, "to admin", Some(at(5))).unwrap();
    messaging::send(&f.db, f.grower, f.customer, "grower again", Some(at(9))).unwrap();

    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    let order: Vec<Uuid> = list.iter().map(|c| c.counterparty.id).collect();
    assert_eq!(order, vec![f.grower, f.admin]);
    assert_eq!(list[0].last_message.content, "grower again");
    assert!(!list[0].last_message_from_viewer);
    assert!(list[1].last_message_from_viewer);
}

#[test]
fn conversation_list_enriches_with_current_profile() {
    let f = fixture();
    messaging::send(&f.db, f.customer, f.grower, "hello", Some(at(0))).unwrap();

    let list = messaging::list_conversations(&f.db, f.customer).unwrap();
    assert_eq!(list[0].counterparty.display_name, "gil");
    assert_eq!(list[0].counterparty.role, Role::Grower);
}

// The walkthrough from the product brief: A messages B, B replies, A reads.
#[test]
fn reply_and_read_walkthrough() {
    let f = fixture();
    let (a, b) = (f.customer, f.grower);

    messaging::send(&f.db, a, b, "hi", Some(at(0))).unwrap();
    let reply = messaging::send(&f.db, b, a, "hello", Some(at(1))).unwrap();

    let list = messaging::list_conversations(&f.db, a).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].counterparty.id, b);
    assert_eq!(list[0].last_message.content, "hello");
    assert_eq!(list[0].unread_count, 1);

    messaging::mark_read(&f.db, a, reply.id).unwrap();
    let list = messaging::list_conversations(&f.db, a).unwrap();
    assert_eq!(list[0].unread_count, 0);

    messaging::mark_read(&f.db, a, reply.id).unwrap();
    let list = messaging::list_conversations(&f.db, a).unwrap();
    assert_eq!(list[0].unread_count, 0);
}
