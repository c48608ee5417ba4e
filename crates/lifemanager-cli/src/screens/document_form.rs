use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lifemanager_core::api::DOCUMENTS_PATH;
use lifemanager_core::{Document, DocumentFile, NewDocument, SessionManager};
use tracing::debug;

use super::{expire_session, require_client};

#[derive(Debug)]
pub struct DocumentForm {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub file: Option<PathBuf>,
    pub as_json: bool,
}

impl DocumentForm {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("Please enter a title.");
        }
        Ok(())
    }
}

pub async fn submit(session: &SessionManager, form: DocumentForm) -> Result<()> {
    form.validate()?;
    let client = require_client(session)?;

    let document = NewDocument::new(form.id, form.title.trim(), form.content);
    let response = if form.as_json {
        client.submit_json(DOCUMENTS_PATH, &document).await
    } else {
        let file = match form.file {
            Some(ref path) => Some(read_attachment(path).await?),
            None => None,
        };
        client.submit_document(&document, file).await
    }
    .context("Could not reach the server")?;

    if response.unauthorized {
        return expire_session(session).await;
    }

    let response = response
        .error_for_status()
        .await
        .context("Request failed")?;

    match response.json::<Document>().await {
        Ok(saved) => println!("Saved document #{}: {}", saved.id, saved.title),
        Err(e) => {
            debug!(error = %e, "Submission response was not a document");
            println!("Request completed successfully!");
        }
    }
    Ok(())
}

async fn read_attachment(path: &Path) -> Result<DocumentFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let file = DocumentFile::new(file_name, bytes);
    Ok(match mime_for(path) {
        Some(mime) => file.with_mime(mime),
        None => file,
    })
}

fn mime_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}
