use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{debug, info};

use banx_core::services::{
    AttachmentKind, attachment_kind, prepare_image_attachment, prepare_text_document,
};
use banx_core::{
    Attachment, AttachmentError, AttachmentErrorCode, ChatSettings, SessionController,
    SessionJsonRepository, SessionRepository,
};

#[derive(Parser, Debug)]
#[command(name = "banx")]
#[command(about = "Chat with a language model; conversations are kept between runs", long_about = None)]
struct Cli {
    /// Session file (defaults to the platform data directory)
    #[arg(long, value_name = "PATH")]
    storage: Option<PathBuf>,

    /// List stored sessions
    #[arg(long)]
    list: bool,

    /// Start a new session before sending
    #[arg(long)]
    new: bool,

    /// Switch to the session with this id
    #[arg(long, value_name = "ID")]
    select: Option<String>,

    /// Remove all messages from the active session
    #[arg(long)]
    clear: bool,

    /// Attach a PNG, JPEG or WebP image
    #[arg(long, value_name = "PATH", conflicts_with = "document")]
    image: Option<PathBuf>,

    /// Attach a plain-text document
    #[arg(long, value_name = "PATH")]
    document: Option<PathBuf>,

    /// Message to send
    prompt: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let repository: Arc<dyn SessionRepository> = match &cli.storage {
        Some(path) => Arc::new(SessionJsonRepository::with_path(path)),
        None => Arc::new(
            SessionJsonRepository::new().context("Could not determine where to store sessions")?,
        ),
    };

    let settings = ChatSettings::from_env();
    info!(mock = !settings.has_credential(), "Starting banx");
    let mut controller = SessionController::new(settings, repository);
    controller.initialize();

    if let Some(id) = &cli.select
        && !controller.select_session(id)
    {
        bail!("No session with id {id}");
    }
    if cli.new {
        controller.start_new_session();
    }
    if cli.clear {
        controller.clear_active_session();
    }

    let prompt = cli.prompt.join(" ");
    if !prompt.trim().is_empty() || cli.image.is_some() || cli.document.is_some() {
        let prepared = prepare_attachment(cli.image.as_deref(), cli.document.as_deref())?;
        controller
            .send_prepared(prompt, prepared)
            .await
            .context("Message failed")?;

        if let Some(reply) = controller.conversation().last_message() {
            println!("{}", reply.content);
        }
    }

    if cli.list {
        let active = controller.active_session_id();
        for session in controller.list_sessions() {
            let marker = if session.id == active { "*" } else { " " };
            println!(
                "{marker} {}  {} ({} messages)",
                session.id,
                session.title,
                session.message_count()
            );
        }
    }

    Ok(())
}

/// Read and prepare the attachment named on the command line.
///
/// I/O failures are errors of the CLI itself; preparation failures are
/// handed to the controller unchanged.
fn prepare_attachment(
    image: Option<&Path>,
    document: Option<&Path>,
) -> Result<Result<Option<Attachment>, AttachmentError>> {
    if let Some(path) = image {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "Read image");
        let prepared = prepare_image_attachment(&file_name(path), mime_type_for(path), &bytes, None);
        return Ok(prepared.map(Some));
    }

    if let Some(path) = document {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "Read document");

        let mime_type = mime_type_for(path);
        let prepared = match attachment_kind(mime_type) {
            Some(AttachmentKind::Document) if mime_type == "text/plain" => {
                prepare_text_document(&file_name(path), &bytes)
            }
            Some(AttachmentKind::Document) => Err(AttachmentError::new(
                AttachmentErrorCode::ProcessingError,
                format!("Text extraction for {mime_type} files is not available."),
            )),
            _ => Err(AttachmentError::new(
                AttachmentErrorCode::UnsupportedType,
                "Unsupported document type.",
            )),
        };
        return Ok(prepared.map(Some));
    }

    Ok(Ok(None))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" | "md" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type_for(Path::new("a/b/Photo.JPG")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(mime_type_for(Path::new("archive")), "application/octet-stream");
    }

    #[test]
    fn test_pdf_is_reported_as_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();

        let prepared = prepare_attachment(None, Some(path.as_path())).unwrap();
        assert_eq!(
            prepared.unwrap_err().code,
            AttachmentErrorCode::ProcessingError
        );
    }

    #[test]
    fn test_text_document_is_prepared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"meeting notes").unwrap();

        let prepared = prepare_attachment(None, Some(path.as_path())).unwrap().unwrap();
        assert_eq!(prepared.map(|a| a.name().to_string()), Some("notes.txt".to_string()));
    }

    #[test]
    fn test_cli_rejects_two_attachments() {
        let parsed = Cli::try_parse_from(["banx", "--image", "a.png", "--document", "b.txt"]);
        assert!(parsed.is_err());
    }
}
