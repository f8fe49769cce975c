//! Logs command handler

use anyhow::{Context, Result};

use quire_core::models::LogEntry;
use quire_core::{Config, PageApi};

use super::connect;
use crate::output::Output;

/// Show the server operation log, oldest first
pub async fn show(config: &Config, limit: Option<usize>, output: &Output) -> Result<()> {
    let api = connect(config)?;

    let entries = api.logs().await.context("Failed to fetch server logs")?;

    output.print_logs(most_recent(&entries, limit));
    Ok(())
}

/// The last `limit` entries (all of them when no limit is given)
fn most_recent(entries: &[LogEntry], limit: Option<usize>) -> &[LogEntry] {
    match limit {
        Some(n) if n < entries.len() => &entries[entries.len() - n..],
        _ => entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str) -> LogEntry {
        LogEntry {
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            action: action.to_string(),
            document_id: "1".to_string(),
            details: String::new(),
            data: None,
        }
    }

    #[test]
    fn test_most_recent() {
        let entries = vec![entry("CREATE"), entry("UPDATE"), entry("DELETE")];

        let actions = |slice: &[LogEntry]| -> Vec<String> {
            slice.iter().map(|e| e.action.clone()).collect()
        };

        assert_eq!(actions(most_recent(&entries, None)), vec!["CREATE", "UPDATE", "DELETE"]);
        assert_eq!(actions(most_recent(&entries, Some(2))), vec!["UPDATE", "DELETE"]);
        assert_eq!(actions(most_recent(&entries, Some(10))).len(), 3);
        assert!(most_recent(&entries, Some(0)).is_empty());
    }
}
