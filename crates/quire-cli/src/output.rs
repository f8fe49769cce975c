//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;
use serde_json::Value;

use quire_core::models::{HealthStatus, LogEntry, ServerStatus};
use quire_core::{Block, Page, SaveStatus};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single page with its blocks
    pub fn print_page(&self, page: &Page) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", page.id);
                println!("Title:    {}", display_title(page));
                println!(
                    "Modified: {}",
                    page.last_modified.format("%Y-%m-%d %H:%M:%S")
                );
                println!();
                println!("── Blocks ({}) ──", page.blocks.len());
                if page.blocks.is_empty() {
                    println!("(empty page)");
                }
                for block in &page.blocks {
                    println!("{}", truncate(&block_preview(block), 76));
                }
            }
            OutputFormat::Json => print_json(page),
            OutputFormat::Quiet => {
                println!("{}", page.id);
            }
        }
    }

    /// Print a list of pages
    pub fn print_pages(&self, pages: &[Page]) {
        match self.format {
            OutputFormat::Human => {
                if pages.is_empty() {
                    println!("No pages found.");
                    return;
                }
                for page in pages {
                    println!(
                        "{} | {} | {} block(s) | {}",
                        page.id,
                        truncate(&display_title(page), 35),
                        page.blocks.len(),
                        page.last_modified.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} page(s)", pages.len());
            }
            OutputFormat::Json => print_json(&pages),
            OutputFormat::Quiet => {
                for page in pages {
                    println!("{}", page.id);
                }
            }
        }
    }

    /// Print server health and statistics
    pub fn print_server_status(&self, api_url: &str, health: &HealthStatus, status: &ServerStatus) {
        match self.format {
            OutputFormat::Human => {
                println!("Quire Server");
                println!("============");
                println!();
                println!("  URL:    {}", api_url);
                println!("  Health: {}", health.status);
                println!("  Uptime: {}", format_uptime(status.uptime));
                println!(
                    "  Memory: {} / {}",
                    format_bytes(status.memory.heap_used),
                    format_bytes(status.memory.heap_total)
                );
                println!();
                println!("Contents:");
                println!("  Documents: {}", status.documents_count);
                println!("  Log entries: {}", status.logs_count);

                if !status.documents.is_empty() {
                    println!();
                    println!("── Documents ──");
                    for doc in &status.documents {
                        println!(
                            "{} | {} block(s) | {}",
                            doc.id,
                            doc.blocks_count,
                            doc.last_modified.as_deref().unwrap_or("-")
                        );
                    }
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "api_url": api_url,
                    "health": health,
                    "status": status
                }));
            }
            OutputFormat::Quiet => {
                println!("{}", health.status);
            }
        }
    }

    /// Print server log entries
    pub fn print_logs(&self, entries: &[LogEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("No log entries.");
                    return;
                }
                for entry in entries {
                    println!(
                        "[{}] {} {} - {}",
                        entry.timestamp,
                        entry.action,
                        entry.document_id,
                        truncate(&entry.details, 50)
                    );
                }
                println!("\n{} entries", entries.len());
            }
            OutputFormat::Json => print_json(&entries),
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{}", entry.action);
                }
            }
        }
    }

    /// Print the outcome of a save
    pub fn print_save_status(&self, status: &SaveStatus) {
        match self.format {
            OutputFormat::Human => println!("Save status: {}", status),
            OutputFormat::Json => {
                let (state, detail) = match status {
                    SaveStatus::Saved { last_saved } => {
                        ("saved", last_saved.map(|at| at.to_rfc3339()))
                    }
                    SaveStatus::Saving => ("saving", None),
                    SaveStatus::Error { message } => ("error", Some(message.clone())),
                };
                println!("{}", serde_json::json!({"save_status": state, "detail": detail}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Title with its emoji prefix, or a placeholder for untitled pages
fn display_title(page: &Page) -> String {
    let title = if page.title.is_empty() {
        "(untitled)"
    } else {
        page.title.as_str()
    };
    match &page.emoji {
        Some(emoji) => format!("{} {}", emoji, title),
        None => title.to_string(),
    }
}

/// One-line text preview of a block
///
/// Blocks are opaque; this looks for the usual `content` shapes (a string,
/// or an array of inline runs with `text`) and falls back to the block type.
fn block_preview(block: &Block) -> String {
    let value = block.as_value();
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("block");

    let text = match value.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(runs)) => runs
            .iter()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    };

    let first_line = text.lines().next().unwrap_or("");
    if first_line.is_empty() {
        format!("[{}]", kind)
    } else {
        format!("[{}] {}", kind, first_line)
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_uptime(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("새 페이지", 10), "새 페이지");
        assert_eq!(truncate("가나다라마바사아자차", 6), "가나다...");
    }

    #[test]
    fn test_display_title() {
        let mut page = Page::new("1", "");
        assert_eq!(display_title(&page), "(untitled)");

        page.title = "Notes".to_string();
        page.emoji = Some("📝".to_string());
        assert_eq!(display_title(&page), "📝 Notes");
    }

    #[test]
    fn test_block_preview() {
        let plain = Block::new(json!({"type": "paragraph", "content": "hello\nworld"}));
        assert_eq!(block_preview(&plain), "[paragraph] hello");

        let runs = Block::new(json!({
            "type": "heading",
            "content": [{"type": "text", "text": "Big "}, {"type": "text", "text": "title"}]
        }));
        assert_eq!(block_preview(&runs), "[heading] Big title");

        let image = Block::new(json!({"type": "image", "props": {"url": "x.png"}}));
        assert_eq!(block_preview(&image), "[image]");

        assert_eq!(block_preview(&Block::new(json!(42))), "[block]");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(5.7), "5s");
        assert_eq!(format_uptime(125.0), "2m 5s");
        assert_eq!(format_uptime(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
