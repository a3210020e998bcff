//! Limits imposed by Discord on the operations commands perform

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::ArchivedMessage;

/// Most messages a single bulk-delete request accepts
pub const BULK_DELETE_MAX: usize = 100;

/// Bulk delete refuses messages older than this many days
pub const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

/// Longest message body Discord accepts
pub const MESSAGE_MAX_LEN: usize = 2000;

/// How a set of messages gets deleted
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    /// Batches of 2..=100 ids, each removable with one bulk request
    pub bulk: Vec<Vec<u64>>,
    /// Ids that need one request each
    pub single: Vec<u64>,
}

/// Split messages into bulk batches and single deletions.
/// Messages close to the age limit are treated as old so a batch never gets
/// rejected because it aged out while being sent.
pub fn plan_deletion(now: DateTime<Utc>, messages: &[ArchivedMessage]) -> DeletionPlan {
    let cutoff = now - Duration::days(BULK_DELETE_MAX_AGE_DAYS) + Duration::minutes(1);

    let (young, old): (Vec<&ArchivedMessage>, Vec<&ArchivedMessage>) =
        messages.iter().partition(|m| m.created_at > cutoff);

    let mut plan = DeletionPlan {
        bulk: Vec::new(),
        single: old.iter().map(|m| m.id).collect(),
    };

    for chunk in young.chunks(BULK_DELETE_MAX) {
        if chunk.len() == 1 {
            plan.single.push(chunk[0].id);
        } else {
            plan.bulk.push(chunk.iter().map(|m| m.id).collect());
        }
    }

    plan
}

/// Break text into pieces no longer than `max` characters,
/// cutting at the last newline of each piece when there is one.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    if max == 0 {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max {
        let hard = rest
            .char_indices()
            .nth(max)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        // a newline sitting right at the limit still counts
        let window = hard + rest[hard..].chars().next().map_or(0, char::len_utf8);
        let cut = match rest[..window].rfind('\n') {
            Some(i) if i > 0 => i,
            _ => hard,
        };
        parts.push(rest[..cut].to_string());
        rest = rest[cut..].strip_prefix('\n').unwrap_or(&rest[cut..]);
    }

    if !rest.is_empty() || parts.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}
