//! User list export
//!
//! Every identity referenced by a ticket ends up in `users.txt`, one per
//! line, in order of first appearance. The list is what an administrator
//! maps to GitLab accounts before running the import.

use crate::adapters::trac::TracClient;
use crate::core::store::{write_bytes, StoreLayout};
use crate::domain::{Result, Ticket};
use crate::log_record_skipped;
use std::collections::HashSet;

/// Collects distinct user identities from tickets
///
/// Per ticket the order is reporter, owner, description revision authors,
/// comment authors, then attachment authors. Empty values are skipped.
pub fn collect_users<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut users = Vec::new();

    for ticket in tickets {
        let candidates = [ticket.reporter(), ticket.owner()]
            .into_iter()
            .chain(ticket.description_history.iter().map(|e| e.author.as_str()))
            .chain(ticket.comments.iter().map(|e| e.author.as_str()))
            .chain(ticket.attachments.iter().map(|a| a.author.as_str()));

        for user in candidates.map(str::trim).filter(|u| !u.is_empty()) {
            if seen.insert(user.to_string()) {
                users.push(user.to_string());
            }
        }
    }
    users
}

/// Scans every ticket and writes `users.txt`; returns the user count
///
/// Tickets that cannot be fetched are skipped.
pub async fn export_users(client: &TracClient, layout: &StoreLayout) -> Result<usize> {
    let ids = client.query_ticket_ids("max=0").await?;
    tracing::info!(tickets = ids.len(), "Scanning tickets for users");

    let mut tickets = Vec::with_capacity(ids.len());
    for id in ids {
        match client.get_ticket(id).await {
            Ok(ticket) => tickets.push(ticket),
            Err(e) => log_record_skipped!("ticket", id, e),
        }
    }

    let users = collect_users(&tickets);
    let mut contents = users.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    write_bytes(&layout.users_file(), contents.as_bytes()).await?;
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attachment, Attributes, ChangeLogEntry};

    fn ticket(id: i64, reporter: &str, owner: &str) -> Ticket {
        let mut attrs = Attributes::new();
        attrs.insert("reporter".to_string(), reporter.into());
        attrs.insert("owner".to_string(), owner.into());
        Ticket::new(id, attrs)
    }

    fn comment(author: &str) -> ChangeLogEntry {
        ChangeLogEntry {
            time: None,
            author: author.to_string(),
            field: "comment".to_string(),
            old_value: None,
            new_value: Some("text".to_string()),
            permanent: true,
        }
    }

    #[test]
    fn test_collect_users_first_appearance_order() {
        let mut first = ticket(1, "alice", "bob");
        first.comments.push(comment("carol"));
        first.comments.push(comment("alice"));

        let mut second = ticket(2, "dave", "");
        second.attachments.push(Attachment {
            filename: "log.txt".to_string(),
            description: String::new(),
            size: 3,
            time: None,
            author: "bob".to_string(),
        });
        second.description_history.push(comment("erin"));

        let users = collect_users([&first, &second]);
        assert_eq!(users, vec!["alice", "bob", "carol", "dave", "erin"]);
    }

    #[test]
    fn test_collect_users_skips_blank() {
        let users = collect_users([&ticket(1, " ", "")]);
        assert!(users.is_empty());
    }
}
