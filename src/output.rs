use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::audit::Report;
use crate::error::AuditError;

/// Destination of a finished report
pub trait OutputSink {
    fn emit(&self, report: &Report) -> Result<(), AuditError>;
}

/// Writes the report as JSON to a file, or to stdout without a destination
#[derive(Debug, Clone, Default)]
pub struct JsonSink {
    pub destination: Option<PathBuf>,
    pub pretty: bool,
}

impl JsonSink {
    pub fn new(destination: Option<PathBuf>, pretty: bool) -> Self {
        Self { destination, pretty }
    }

    pub fn render(&self, report: &Report) -> Result<String, AuditError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

impl OutputSink for JsonSink {
    fn emit(&self, report: &Report) -> Result<(), AuditError> {
        let json = self.render(report)?;
        match &self.destination {
            Some(path) => {
                std::fs::write(path, json)?;
                info!("Report written to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(json.as_bytes())?;
                stdout.write_all(b"\n")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_compact_and_pretty() {
        let report = Report {
            target: "example.com.".to_string(),
            ..Default::default()
        };

        let compact = JsonSink::new(None, false).render(&report).unwrap();
        assert!(!compact.contains('\n'));
        assert!(compact.starts_with("{\"target\":\"example.com.\""));

        let pretty = JsonSink::new(None, true).render(&report).unwrap();
        assert!(pretty.contains("\n  \"target\": \"example.com.\""));
    }
}
