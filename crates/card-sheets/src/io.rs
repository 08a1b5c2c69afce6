//! Document I/O

use crate::types::*;
use lopdf::Document;
use std::path::Path;

/// Save the merged document, creating the parent directory if needed.
pub async fn save_pdf(mut doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_owned();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = tokio::task::spawn_blocking(move || {
        let mut writer = Vec::new();
        doc.save_to(&mut writer)?;
        Ok::<_, SheetError>(writer)
    })
    .await??;
    tokio::fs::write(&path, &bytes).await?;
    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
