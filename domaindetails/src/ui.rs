//! Text-mode display logic for the domaindetails CLI.
//!
//! Renders lookup results and cache reports for humans. JSON output is
//! produced in `main.rs` straight from the library types.

use console::{pad_str, style, Alignment, Term};
use domaindetails_lib::{CacheInfo, CacheMetadata, LookupResult, ParsedRecord};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RULE_WIDTH: usize = 60;
const LABEL_WIDTH: usize = 17;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A braille-dot spinner on stderr, shown while a lookup is in flight.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear its line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Lookup results ───────────────────────────────────────────────────────────

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

/// Print a lookup result in the human-readable layout.
pub fn print_result(result: &LookupResult, show_raw: bool) {
    println!("{}", style(rule()).dim());
    println!("{} {}", style("Domain:").bold(), result.domain);
    println!("{} {}", style("Method:").bold(), result.method);
    println!("{}", style(rule()).dim());

    if result.available {
        println!("{}", style("✓ Domain appears to be available").green().bold());
        if let Some(message) = &result.message {
            println!("  {}", message);
        }
        return;
    }

    if let Some(parsed) = &result.parsed {
        for line in format_record(parsed) {
            println!("{}", line);
        }
    }

    if show_raw {
        if let Some(raw) = &result.raw {
            println!();
            println!("{}", style(rule()).dim());
            println!("{}", style("Raw Response:").bold());
            println!("{}", style(rule()).dim());
            println!("{}", raw);
        }
    }
}

/// Lines describing a registered domain; empty fields are skipped.
pub fn format_record(parsed: &ParsedRecord) -> Vec<String> {
    let mut lines = Vec::new();

    let fields = [
        ("Domain Name:", &parsed.domain_name),
        ("Registrar:", &parsed.registrar),
        ("Registrant:", &parsed.registrant),
        ("Created:", &parsed.creation_date),
        ("Expires:", &parsed.expiration_date),
        ("Last Modified:", &parsed.last_modified),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(field_line(label, value));
        }
    }

    if !parsed.status.is_empty() {
        lines.push(String::new());
        lines.push(style("Status:").bold().to_string());
        lines.extend(parsed.status.iter().map(|s| format!("  • {}", s)));
    }

    if !parsed.nameservers.is_empty() {
        lines.push(String::new());
        lines.push(style("Nameservers:").bold().to_string());
        lines.extend(parsed.nameservers.iter().map(|ns| format!("  • {}", ns)));
    }

    if let Some(dnssec) = parsed.dnssec {
        lines.push(String::new());
        lines.push(field_line("DNSSEC:", &dnssec.to_string()));
    }

    if let Some(server) = parsed.whois_server.as_deref().filter(|s| !s.is_empty()) {
        lines.push(field_line("WHOIS Server:", server));
    }

    lines
}

fn field_line(label: &str, value: &str) -> String {
    format!(
        "{}{}",
        style(pad_str(label, LABEL_WIDTH, Alignment::Left, None)).bold(),
        value
    )
}

// ── Cache reports ────────────────────────────────────────────────────────────

/// Print the `cache info` report.
pub fn print_cache_info(info: &CacheInfo) {
    let valid = if info.is_valid {
        style("yes").green()
    } else {
        style("no (expired)").yellow()
    };

    println!("Cache directory: {}", info.path.display());
    println!(
        "Last updated:    {}",
        info.last_updated.format("%Y-%m-%d %H:%M:%S")
    );
    println!("Bootstrap ver:   {}", info.version);
    println!("TLDs cached:     {}", info.tld_count);
    println!("Cache age:       {}", format_age(info.age));
    println!("Cache valid:     {}", valid);
}

/// JSON shape of the `cache info` report.
pub fn cache_info_json(info: &CacheInfo) -> serde_json::Value {
    serde_json::json!({
        "path": info.path.display().to_string(),
        "lastUpdated": info.last_updated.to_rfc3339(),
        "version": info.version,
        "tldCount": info.tld_count,
        "ageSeconds": info.age.num_seconds(),
        "isValid": info.is_valid,
    })
}

/// Print the `cache update` confirmation.
pub fn print_cache_updated(meta: &CacheMetadata) {
    println!("{}", style("Cache updated successfully").green());
    println!("TLDs cached:     {}", meta.tld_count);
    println!("Bootstrap ver:   {}", meta.version);
}

/// Render a cache age as `2h 5m`, `3m 10s` or `42s`.
pub fn format_age(age: chrono::Duration) -> String {
    let total = age.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domaindetails_lib::DnssecState;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_age(chrono::Duration::seconds(190)), "3m 10s");
        assert_eq!(format_age(chrono::Duration::seconds(7_500)), "2h 5m");
        assert_eq!(format_age(chrono::Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_format_record_skips_empty_fields() {
        console::set_colors_enabled(false);

        let parsed = ParsedRecord {
            domain_name: Some("EXAMPLE.COM".to_string()),
            registrar: Some(String::new()),
            nameservers: vec!["a.iana-servers.net".to_string()],
            dnssec: Some(DnssecState::Signed),
            ..Default::default()
        };

        let lines = format_record(&parsed);
        assert_eq!(lines[0], "Domain Name:     EXAMPLE.COM");
        assert!(!lines.iter().any(|l| l.starts_with("Registrar:")));
        assert!(lines.contains(&"  • a.iana-servers.net".to_string()));
        assert!(lines.contains(&"DNSSEC:          signed".to_string()));
    }

    #[test]
    fn test_format_record_unsigned_dnssec() {
        console::set_colors_enabled(false);

        let parsed = ParsedRecord {
            dnssec: Some(DnssecState::Unsigned),
            ..Default::default()
        };
        assert_eq!(
            format_record(&parsed),
            vec![String::new(), "DNSSEC:          unsigned".to_string()]
        );
    }
}
