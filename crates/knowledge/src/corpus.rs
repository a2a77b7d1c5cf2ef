//! Source document discovery.

use crate::types::Document;
use helpdesk_core::{AppError, AppResult};
use std::path::Path;
use walkdir::WalkDir;

/// Read every `*.txt` file directly inside `raw_dir`, sorted by file name.
///
/// Subdirectories are not descended into. A missing directory reads as empty.
pub fn load_documents(raw_dir: &Path) -> AppResult<Vec<Document>> {
    if !raw_dir.exists() {
        tracing::warn!("Raw document directory {:?} does not exist", raw_dir);
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(raw_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            AppError::Index(format!("Failed to scan {:?}: {}", raw_dir, e))
        })?;

        let path = entry.path();
        let is_txt = path.extension().and_then(|e| e.to_str()) == Some("txt");
        if !entry.file_type().is_file() || !is_txt {
            continue;
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Index(format!("Failed to read {:?}: {}", path, e)))?;

        documents.push(Document {
            file: entry.file_name().to_string_lossy().into_owned(),
            path: path.to_path_buf(),
            text,
        });
    }

    tracing::debug!("Found {} documents in {:?}", documents.len(), raw_dir);
    Ok(documents)
}
