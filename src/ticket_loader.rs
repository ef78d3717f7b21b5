/// Ticket loading from spreadsheet exports
///
/// Reads CSV exports of the service-desk spreadsheet and normalises each row
/// into a `Ticket`: a canonical lower-cased description used for embedding and
/// entity extraction, plus a fixed summary block for display.
use crate::entity_extractor::extract_entities;
use crate::grouping::Item;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Column names tried, in order, for the ticket description
pub const DESCRIPTION_FIELDS: &[&str] = &[
    "Long Description",
    "Short Description",
    "Issue Description",
    "Description",
    "Issue description",
    "Summary",
];

pub const NO_DESCRIPTION: &str = "no description provided";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: Option<String>,
    pub display_text: String,
    pub embedding_text: String,
}

impl Ticket {
    /// Build a ticket from one spreadsheet row (header → cell value)
    pub fn from_fields(row: &HashMap<String, String>) -> Self {
        let description =
            find_description(row).unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let ticket_id = field(row, &["Ticket ID", "Incident ID"]).map(str::to_string);

        let display_text = format!(
            "Ticket Summary\n\
             --------------\n\
             Ticket ID: {}\n\
             Date Created: {}\n\
             Department: {}\n\
             Assigned To: {}\n\
             Priority: {}\n\
             Status: {}\n\n\
             Issue Description:\n\
             {}",
            ticket_id.as_deref().unwrap_or("None"),
            field(row, &["Date Created", "Opened At"]).unwrap_or("None"),
            field(row, &["Department", "Assignment Group"]).unwrap_or("None"),
            field(row, &["Assigned To"]).unwrap_or("None"),
            field(row, &["Priority"]).unwrap_or("None"),
            field(row, &["Status"]).unwrap_or("None"),
            description
        );

        Self {
            ticket_id,
            display_text,
            embedding_text: description,
        }
    }

    /// Engine view of this ticket, tagged with the entities in its description
    pub fn to_item(&self, index: usize, embedding: Vec<f32>) -> Item {
        Item::new(index, embedding, extract_entities(&self.embedding_text))
    }
}

/// First usable description column, trimmed and lower-cased
///
/// Empty cells and spreadsheet `nan` placeholders are skipped.
pub fn find_description(row: &HashMap<String, String>) -> Option<String> {
    DESCRIPTION_FIELDS.iter().find_map(|key| {
        let text = row.get(*key)?.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(text.to_lowercase())
        }
    })
}

fn field<'a>(row: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
}

/// Load tickets from a CSV file with a header row
pub fn load_tickets_csv(path: impl AsRef<Path>) -> Result<Vec<Ticket>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open ticket file: {}", path.display()))?;

    load_tickets_from_reader(file)
        .with_context(|| format!("Failed to parse ticket file: {}", path.display()))
}

pub fn load_tickets_from_reader<R: Read>(reader: R) -> Result<Vec<Ticket>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut tickets = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Bad CSV record at row {}", line + 1))?;

        let row: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.trim().to_string(), value.to_string()))
            .collect();

        tickets.push(Ticket::from_fields(&row));
    }

    tracing::debug!("Loaded {} tickets", tickets.len());
    Ok(tickets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_description_priority() {
        let r = row(&[
            ("Short Description", "Short one"),
            ("Long Description", "  The LONG one  "),
        ]);
        assert_eq!(find_description(&r).as_deref(), Some("the long one"));
    }

    #[test]
    fn test_description_skips_nan_and_blank() {
        let r = row(&[
            ("Long Description", "NaN"),
            ("Short Description", "   "),
            ("Summary", "VPN drops"),
        ]);
        assert_eq!(find_description(&r).as_deref(), Some("vpn drops"));
    }

    #[test]
    fn test_missing_description() {
        let ticket = Ticket::from_fields(&row(&[("Ticket ID", "T-1")]));
        assert_eq!(ticket.embedding_text, NO_DESCRIPTION);
        assert_eq!(ticket.ticket_id.as_deref(), Some("T-1"));
    }

    #[test]
    fn test_display_text_layout() {
        let ticket = Ticket::from_fields(&row(&[
            ("Incident ID", "INC100001"),
            ("Opened At", "2025-02-01 10:00:00"),
            ("Assignment Group", "Secure Access"),
            ("Priority", "2"),
            ("Description", "MFA push not received"),
        ]));

        assert_eq!(
            ticket.display_text,
            "Ticket Summary\n\
             --------------\n\
             Ticket ID: INC100001\n\
             Date Created: 2025-02-01 10:00:00\n\
             Department: Secure Access\n\
             Assigned To: None\n\
             Priority: 2\n\
             Status: None\n\n\
             Issue Description:\n\
             mfa push not received"
        );
    }

    #[test]
    fn test_to_item_extracts_entities() {
        let ticket = Ticket::from_fields(&row(&[(
            "Description",
            "Timeouts on MFA-GATEWAY-01 from 10.24.66.20",
        )]));
        let item = ticket.to_item(3, vec![0.1, 0.2]);

        assert_eq!(item.index(), 3);
        assert!(item.entity_tags().contains("mfa-gateway-01"));
        assert!(item.entity_tags().contains("10.24.66.20"));
    }

    #[test]
    fn test_load_from_reader() {
        let csv = "Ticket ID,Description,Status\n\
                   T-1,Password reset loop,Open\n\
                   T-2,,Closed\n";

        let tickets = load_tickets_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].embedding_text, "password reset loop");
        assert_eq!(tickets[1].embedding_text, NO_DESCRIPTION);
        assert!(tickets[1].display_text.contains("Status: Closed"));
    }
}
