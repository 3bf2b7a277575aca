//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::{bytes_to_mib_ceil, MemoryStats};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Memory statistics report for display
#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub device: String,
    pub backend: String,
    pub duration_seconds: Option<f64>,
    pub stats: MemoryStats,
}

impl TableDisplay for MemoryReport {
    fn to_table(&self) -> String {
        let mut output = format!("Device: {} ({})\n", self.device, self.backend);
        if let Some(seconds) = self.duration_seconds {
            output.push_str(&format!("Window: {:.1}s\n", seconds));
        }

        for (key, value) in self.stats.iter() {
            output.push_str(&format!(
                "  {:<14} {:>8} MiB\n",
                key,
                bytes_to_mib_ceil(value)
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        format!("{} {}", self.device, self.stats)
    }
}
