//! Ticket field export

use crate::adapters::trac::TracClient;
use crate::core::store::{write_json, StoreLayout};
use crate::domain::{Result, TicketField};

/// Fields whose options are mapped to GitLab labels
pub const EXPORTED_FIELDS: [&str; 3] = ["priority", "component", "type"];

pub fn select_fields(fields: Vec<TicketField>) -> Vec<TicketField> {
    fields
        .into_iter()
        .filter(|f| EXPORTED_FIELDS.contains(&f.name.as_str()))
        .collect()
}

/// Writes `ticket-fields.json`; returns the number of fields written
pub async fn export_ticket_fields(client: &TracClient, layout: &StoreLayout) -> Result<usize> {
    let fields = select_fields(client.ticket_fields().await?);
    write_json(&layout.ticket_fields_file(), &fields).await?;
    Ok(fields.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> TicketField {
        TicketField {
            name: name.to_string(),
            label: name.to_string(),
            field_type: "select".to_string(),
            options: vec!["a".to_string()],
        }
    }

    #[test]
    fn test_select_fields() {
        let selected = select_fields(vec![
            field("summary"),
            field("priority"),
            field("type"),
            field("keywords"),
            field("component"),
        ]);
        let names: Vec<&str> = selected.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["priority", "type", "component"]);
    }
}
