use crate::domain::ports::ReportSink;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Writes report lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReport;

impl ReportSink for ConsoleReport {
    fn line(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", line) {
            tracing::error!("Failed to write report line: {}", e);
        }
    }
}

/// Keeps report lines in memory. Clones share the same lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryReport {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All lines, each terminated by a newline.
    pub fn contents(&self) -> String {
        self.lines()
            .into_iter()
            .map(|line| line + "\n")
            .collect()
    }
}

impl ReportSink for MemoryReport {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_report_clones_share_lines() {
        let report = MemoryReport::new();
        let writer = report.clone();

        writer.line("first");
        writer.line("second");

        assert_eq!(report.lines(), vec!["first", "second"]);
        assert_eq!(report.contents(), "first\nsecond\n");
    }
}
