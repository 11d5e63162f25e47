//! Output formatting and writing utilities

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Writes command results in the selected format
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, content: &[u8]) -> Result<()> {
        self.writer.write_all(content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an informational message (human format only, suppressed by --quiet)
    pub fn info(&mut self, message: &str) -> Result<()> {
        tracing::debug!("Output info: {}", message);
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        let line = if self.use_color {
            message.dimmed().to_string()
        } else {
            message.to_string()
        };
        self.writeln(&line)
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        let line = if self.use_color {
            format!("{} {}", "✓".green().bold(), message)
        } else {
            format!("✓ {}", message)
        };
        self.writeln(&line)
    }

    /// Write a serializable value in the selected format
    pub fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
            OutputFormat::Human | OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
        };
        self.writeln(&rendered)
    }
}
