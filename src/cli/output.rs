//! CLI output formatting utilities.

use chrono::{DateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an indexed source file summary.
    pub fn source_info(file: &str, chunks: u32, indexed_at: &DateTime<Utc>) {
        println!(
            "  {} {} ({} chunks, indexed {})",
            style("*").cyan(),
            style(file).bold(),
            chunks,
            style(indexed_at.format("%Y-%m-%d").to_string()).dim()
        );
    }

    /// Print a search result.
    pub fn search_result(file: &str, score: f32, content: &str) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(file).bold(),
            score
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Create a progress bar.
    pub fn progress_bar(len: u64, msg: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_message(msg.to_string());
        pb
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Truncate content with ellipsis, never splitting a multi-byte character.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.len() <= max_len {
        return content;
    }
    let mut cut = max_len;
    while cut > 0 && !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &content[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview_short_text_unchanged() {
        assert_eq!(content_preview("short", 200), "short");
    }

    #[test]
    fn test_content_preview_flattens_newlines() {
        assert_eq!(content_preview("a\nb\nc", 200), "a b c");
    }

    #[test]
    fn test_content_preview_respects_char_boundaries() {
        // Each of these characters is 3 bytes; a cut at 10 lands mid-char.
        let text = "存量與流量的關係";
        let preview = content_preview(text, 10);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 13);
        // The preview must still be valid UTF-8 prefix of the input.
        assert!(text.starts_with(preview.trim_end_matches("...")));
    }
}
