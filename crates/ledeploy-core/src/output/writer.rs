//! Writer for the GitHub Actions `$GITHUB_OUTPUT` file

use std::io::Write;
use std::path::Path;

use super::format::{safe_output_escape, ActionOutputs};
use crate::error::Result;

/// Heredoc delimiter used for every value
pub const OUTPUT_DELIMITER: &str = "LEDEPLOY_EOF";

/// Step output file writer
pub struct OutputWriter;

impl OutputWriter {
    /// Render outputs using the multiline `name<<DELIM` syntax
    pub fn render(outputs: &ActionOutputs) -> String {
        let mut buf = String::with_capacity(128);
        for (name, value) in outputs.pairs() {
            buf.push_str(name);
            buf.push_str("<<");
            buf.push_str(OUTPUT_DELIMITER);
            buf.push('\n');
            buf.push_str(&safe_output_escape(value));
            buf.push('\n');
            buf.push_str(OUTPUT_DELIMITER);
            buf.push('\n');
        }
        buf
    }

    /// Append outputs to the file at `path`, creating it if needed
    pub fn append(path: &Path, outputs: &ActionOutputs) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(Self::render(outputs).as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outputs() -> ActionOutputs {
        ActionOutputs {
            version: "1.2.3".to_string(),
            release_id: "42".to_string(),
        }
    }

    #[test]
    fn test_render() {
        assert_eq!(
            OutputWriter::render(&outputs()),
            "version<<LEDEPLOY_EOF\n1.2.3\nLEDEPLOY_EOF\nrelease_id<<LEDEPLOY_EOF\n42\nLEDEPLOY_EOF\n"
        );
    }

    #[test]
    fn test_render_escapes_newlines() {
        let outputs = ActionOutputs {
            version: "1.2.3\nLEDEPLOY_EOF\ninjected=1".to_string(),
            release_id: "42".to_string(),
        };
        let rendered = OutputWriter::render(&outputs);
        assert!(rendered.contains("1.2.3%0ALEDEPLOY_EOF%0Ainjected=1\n"));
        assert!(!rendered.contains("\ninjected=1"));
    }

    #[test]
    fn test_append_preserves_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "previous=step\n").unwrap();

        OutputWriter::append(&path, &outputs()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous=step\nversion<<LEDEPLOY_EOF\n"));
        assert!(content.ends_with("release_id<<LEDEPLOY_EOF\n42\nLEDEPLOY_EOF\n"));
    }

    #[test]
    fn test_append_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new_output");
        OutputWriter::append(&path, &outputs()).unwrap();
        assert!(path.exists());
    }
}
