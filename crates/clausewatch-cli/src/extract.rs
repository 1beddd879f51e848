//! Text extraction from uploaded documents.
//!
//! Plain text is read directly. PDFs go through `pdftotext` and images
//! through `tesseract`, both run as external processes writing to stdout.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tokio::process::Command;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: &'static str, detail: String },

    #[error("no text could be extracted from {0}")]
    Empty(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Pdf,
    Image,
}

impl DocumentKind {
    fn detect(path: &Path) -> Result<Self, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" | "md" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp" => Ok(Self::Image),
            "" => Err(ExtractionError::UnsupportedType(path.display().to_string())),
            other => Err(ExtractionError::UnsupportedType(format!(".{other}"))),
        }
    }
}

/// Extract the text content of a document. Blank output is an error.
pub async fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let kind = DocumentKind::detect(path)?;
    let started = Instant::now();
    info!(path = %path.display(), kind = ?kind, "extracting text");

    let text = match kind {
        DocumentKind::Text => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ExtractionError::Io {
                    path: path.to_path_buf(),
                    source,
                })?
        }
        DocumentKind::Pdf => {
            let path_arg = path.to_string_lossy().into_owned();
            run_tool("pdftotext", &["-layout", path_arg.as_str(), "-"]).await?
        }
        DocumentKind::Image => {
            let path_arg = path.to_string_lossy().into_owned();
            run_tool("tesseract", &[path_arg.as_str(), "stdout", "-l", "eng"]).await?
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty(path.to_path_buf()));
    }

    info!(
        elapsed_secs = started.elapsed().as_secs_f64(),
        chars = text.chars().count(),
        "extraction complete"
    );
    Ok(text)
}

async fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, ExtractionError> {
    let output = Command::new(tool).args(args).output().await.map_err(|e| {
        let detail = if e.kind() == ErrorKind::NotFound {
            "not installed or not on PATH".to_string()
        } else {
            e.to_string()
        };
        ExtractionError::ToolFailed { tool, detail }
    })?;

    if !output.status.success() {
        return Err(ExtractionError::ToolFailed {
            tool,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::detect(Path::new("a.TXT")).unwrap(), DocumentKind::Text);
        assert_eq!(DocumentKind::detect(Path::new("a.pdf")).unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect(Path::new("scan.JPEG")).unwrap(), DocumentKind::Image);
        assert!(matches!(
            DocumentKind::detect(Path::new("a.docx")),
            Err(ExtractionError::UnsupportedType(ext)) if ext == ".docx"
        ));
        assert!(DocumentKind::detect(Path::new("README")).is_err());
    }

    #[tokio::test]
    async fn reads_plain_text() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("terms.txt");
        std::fs::write(&path, "A late fee of $25 applies.").unwrap();
        assert_eq!(extract_text(&path).await.unwrap(), "A late fee of $25 applies.");
    }

    #[tokio::test]
    async fn blank_file_is_empty_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("blank.md");
        std::fs::write(&path, " \n\t\n").unwrap();
        assert!(matches!(extract_text(&path).await, Err(ExtractionError::Empty(_))));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("missing.txt");
        assert!(matches!(extract_text(&path).await, Err(ExtractionError::Io { .. })));
    }
}
