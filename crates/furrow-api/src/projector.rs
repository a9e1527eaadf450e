use std::cmp::Ordering;
use std::collections::HashMap;

use furrow_types::models::{ConversationKey, Message};
use uuid::Uuid;

/// One conversation as seen by a viewer, before directory enrichment.
/// The messaging service attaches the counterparty profile afterwards.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub counterparty_id: Uuid,
    pub last_message: Message,
    pub unread_count: usize,
    pub last_message_from_viewer: bool,
}

/// Project the viewer's flat message log into per-counterparty summaries.
///
/// Pure aggregation: no I/O, no clock, deterministic for a given input.
/// The result is sorted by last-message time descending, ties broken by
/// last-message id descending, so pagination over the list is stable.
pub fn project(viewer: Uuid, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut groups: HashMap<ConversationKey, (usize, &Message)> = HashMap::new();

    for message in messages {
        let group = groups.entry(message.key()).or_insert((0, message));
        group.0 += usize::from(message.is_unread_by(viewer));
        if newer(message, group.1) {
            group.1 = message;
        }
    }

    let mut conversations: Vec<ConversationSummary> = groups
        .into_iter()
        .filter_map(|(key, (unread_count, last))| {
            // A key that does not include the viewer cannot have come from
            // the viewer's own log; drop it rather than misattribute it.
            let counterparty_id = key.counterparty_of(viewer)?;
            Some(ConversationSummary {
                counterparty_id,
                last_message: last.clone(),
                unread_count,
                last_message_from_viewer: last.sender_id == viewer,
            })
        })
        .collect();

    conversations.sort_by(|a, b| {
        b.last_message
            .sent_at
            .cmp(&a.last_message.sent_at)
            .then_with(|| b.last_message.id.cmp(&a.last_message.id))
    });

    conversations
}

/// Chronological reading order for a single thread: ascending send time,
/// ascending id on ties.
pub fn sort_thread(messages: &mut [Message]) {
    messages.sort_by(|a, b| match a.sent_at.cmp(&b.sent_at) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}

fn newer(candidate: &Message, current: &Message) -> bool {
    match candidate.sent_at.cmp(&current.sent_at) {
        Ordering::Greater => true,
        Ordering::Equal => candidate.id > current.id,
        Ordering::Less => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 1, 9, minute, 0).unwrap()
    }

    fn msg(id: u128, from: Uuid, to: Uuid, minute: u32, read: bool) -> Message {
        Message {
            id: uid(id),
            sender_id: from,
            recipient_id: to,
            content: format!("message {}", id),
            sent_at: at(minute),
            read_at: read.then(|| at(minute + 1)),
        }
    }

    #[test]
    fn empty_log_projects_to_empty_list() {
        assert!(project(uid(1), &[]).is_empty());
    }

    #[test]
    fn groups_by_counterparty_regardless_of_direction() {
        let (me, alice, bob) = (uid(1), uid(2), uid(3));
        let log = vec![
            msg(10, me, alice, 0, false),
            msg(11, alice, me, 1, false),
            msg(12, bob, me, 2, false),
        ];

        let conversations = project(me, &log);
        assert_eq!(conversations.len(), 2);

        let with_alice = conversations.iter().find(|c| c.counterparty_id == alice).unwrap();
        assert_eq!(with_alice.last_message.id, uid(11));
        let with_bob = conversations.iter().find(|c| c.counterparty_id == bob).unwrap();
        assert_eq!(with_bob.last_message.id, uid(12));
    }

    #[test]
    fn messages_not_involving_viewer_are_dropped() {
        let (me, alice, bob) = (uid(1), uid(2), uid(3));
        let log = vec![msg(10, alice, bob, 0, false), msg(11, alice, me, 1, false)];

        let conversations = project(me, &log);
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].counterparty_id, alice);
    }

    #[test]
    fn unread_counts_only_messages_addressed_to_viewer() {
        let (me, alice) = (uid(1), uid(2));
        let log = vec![
            msg(10, me, alice, 0, false),     // sent by viewer, never unread for viewer
            msg(11, alice, me, 1, false),     // unread
            msg(12, alice, me, 2, true),      // read
            msg(13, alice, me, 3, false),     // unread
        ];

        let conversations = project(me, &log);
        assert_eq!(conversations[0].unread_count, 2);

        // The same log from Alice's side: only the viewer-sent message counts.
        let alices = project(alice, &log);
        assert_eq!(alices[0].unread_count, 1);
    }

    #[test]
    fn outbound_only_group_has_zero_unread() {
        let (me, alice) = (uid(1), uid(2));
        let log = vec![msg(10, me, alice, 0, false), msg(11, me, alice, 1, false)];

        let conversations = project(me, &log);
        assert_eq!(conversations[0].unread_count, 0);
        assert!(conversations[0].last_message_from_viewer);
    }

    #[test]
    fn list_sorted_by_last_message_time_descending() {
        let (me, alice, bob, carol) = (uid(1), uid(2), uid(3), uid(4));
        let log = vec![
            msg(10, alice, me, 5, false),
            msg(11, bob, me, 9, false),
            msg(12, carol, me, 1, false),
        ];

        let order: Vec<Uuid> = project(me, &log).iter().map(|c| c.counterparty_id).collect();
        assert_eq!(order, vec![bob, alice, carol]);
    }

    #[test]
    fn identical_timestamps_fall_back_to_id_ordering() {
        let (me, alice, bob) = (uid(1), uid(2), uid(3));
        let log = vec![msg(20, alice, me, 5, false), msg(30, bob, me, 5, false)];

        let first = project(me, &log);
        let second = project(me, &log);

        let order: Vec<Uuid> = first.iter().map(|c| c.counterparty_id).collect();
        // Higher last-message id wins the tie, and the order is repeatable.
        assert_eq!(order, vec![bob, alice]);
        assert_eq!(
            order,
            second.iter().map(|c| c.counterparty_id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn last_message_tie_broken_by_id_within_group() {
        let (me, alice) = (uid(1), uid(2));
        let log = vec![msg(30, alice, me, 5, false), msg(20, me, alice, 5, false)];

        let conversations = project(me, &log);
        assert_eq!(conversations[0].last_message.id, uid(30));
        assert!(!conversations[0].last_message_from_viewer);
    }

    #[test]
    fn thread_sort_is_chronological_with_id_ties() {
        let (me, alice) = (uid(1), uid(2));
        let mut thread = vec![
            msg(30, alice, me, 5, false),
            msg(20, me, alice, 5, false),
            msg(10, me, alice, 1, false),
        ];

        sort_thread(&mut thread);
        let ids: Vec<Uuid> = thread.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![uid(10), uid(20), uid(30)]);
    }
}
