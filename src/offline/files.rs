//! On-disk storage for files attached to queued actions.
//!
//! Layout under the files root:
//!
//! ```text
//! workshop/<workshop id>/submission/add
//! workshop/<workshop id>/submission/update_<submission id>
//! workshop/<workshop id>/assessment/<assessment id>
//! ```

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::site::RemoteFile;

/// Length of the unique prefix put in front of stored file names
const PREFIX_LEN: usize = 33;

/// A file attached to a submission or an assessment
#[derive(Clone, Debug, PartialEq)]
pub enum AttachmentFile {
    /// Already on the site
    Online(RemoteFile),
    /// Only on this device
    Local { filename: String, bytes: Vec<u8> },
}

impl AttachmentFile {
    pub fn local(filename: &str, bytes: impl Into<Vec<u8>>) -> Self {
        AttachmentFile::Local {
            filename: filename.to_string(),
            bytes: bytes.into(),
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            AttachmentFile::Online(file) => &file.filename,
            AttachmentFile::Local { filename, .. } => filename,
        }
    }
}

/// Descriptor of the files kept for a queued action
///
/// Online files are kept by reference. `offline` counts the local copies in
/// the action's folder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredFiles {
    #[serde(default)]
    pub online: Vec<RemoteFile>,
    #[serde(default)]
    pub offline: usize,
}

impl StoredFiles {
    pub fn is_empty(&self) -> bool {
        self.online.is_empty() && self.offline == 0
    }
}

/// Folder tree holding the attachments of queued actions.
#[derive(Clone, Debug)]
pub struct OfflineFiles {
    root: PathBuf,
}

impl OfflineFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn workshop_folder(&self, workshop_id: i64) -> PathBuf {
        self.root.join("workshop").join(workshop_id.to_string())
    }

    /// Folder of a submission action. New submissions share the `add` folder.
    pub fn submission_folder(&self, workshop_id: i64, submission_id: i64, editing: bool) -> PathBuf {
        let folder = if editing {
            format!("update_{}", submission_id)
        } else {
            "add".to_string()
        };
        self.workshop_folder(workshop_id).join("submission").join(folder)
    }

    pub fn assessment_folder(&self, workshop_id: i64, assessment_id: i64) -> PathBuf {
        self.workshop_folder(workshop_id)
            .join("assessment")
            .join(assessment_id.to_string())
    }

    pub async fn store_submission_files(
        &self,
        workshop_id: i64,
        submission_id: i64,
        editing: bool,
        files: &[AttachmentFile],
    ) -> Result<StoredFiles> {
        store_files(&self.submission_folder(workshop_id, submission_id, editing), files).await
    }

    pub async fn get_submission_files(
        &self,
        workshop_id: i64,
        submission_id: i64,
        editing: bool,
        stored: &StoredFiles,
    ) -> Result<Vec<AttachmentFile>> {
        read_files(&self.submission_folder(workshop_id, submission_id, editing), stored).await
    }

    pub async fn delete_submission_files(&self, workshop_id: i64, submission_id: i64, editing: bool) -> Result<()> {
        remove_folder(&self.submission_folder(workshop_id, submission_id, editing)).await
    }

    pub async fn store_assessment_files(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        files: &[AttachmentFile],
    ) -> Result<StoredFiles> {
        store_files(&self.assessment_folder(workshop_id, assessment_id), files).await
    }

    pub async fn get_assessment_files(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        stored: &StoredFiles,
    ) -> Result<Vec<AttachmentFile>> {
        read_files(&self.assessment_folder(workshop_id, assessment_id), stored).await
    }

    pub async fn delete_assessment_files(&self, workshop_id: i64, assessment_id: i64) -> Result<()> {
        remove_folder(&self.assessment_folder(workshop_id, assessment_id)).await
    }
}

/// Replace the contents of `folder` with the local files of `files`
async fn store_files(folder: &Path, files: &[AttachmentFile]) -> Result<StoredFiles> {
    remove_folder(folder).await?;

    let mut stored = StoredFiles::default();
    for file in files {
        match file {
            AttachmentFile::Online(remote) => stored.online.push(remote.clone()),
            AttachmentFile::Local { filename, bytes } => {
                if stored.offline == 0 {
                    tokio::fs::create_dir_all(folder)
                        .await
                        .with_context(|| format!("Failed to create folder: {}", folder.display()))?;
                }
                let path = folder.join(format!("{}_{}", Uuid::new_v4().simple(), filename));
                tokio::fs::write(&path, bytes)
                    .await
                    .with_context(|| format!("Failed to store file: {}", path.display()))?;
                stored.offline += 1;
            }
        }
    }

    debug!(
        "📎 Stored {} local files in {} ({} online)",
        stored.offline,
        folder.display(),
        stored.online.len()
    );
    Ok(stored)
}

/// Rebuild the file list of a queued action
///
/// A missing folder yields only the online files.
async fn read_files(folder: &Path, stored: &StoredFiles) -> Result<Vec<AttachmentFile>> {
    let mut files: Vec<AttachmentFile> = stored.online.iter().cloned().map(AttachmentFile::Online).collect();
    if stored.offline == 0 || !folder.exists() {
        return Ok(files);
    }

    let mut local = Vec::new();
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .with_context(|| format!("Failed to read folder: {}", folder.display()))?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let stored_name = entry.file_name().to_string_lossy().to_string();
        let bytes = tokio::fs::read(entry.path())
            .await
            .with_context(|| format!("Failed to read file: {}", entry.path().display()))?;
        local.push(AttachmentFile::Local {
            filename: original_name(&stored_name).to_string(),
            bytes,
        });
    }

    local.sort_by(|a, b| a.filename().cmp(b.filename()));
    files.extend(local);
    Ok(files)
}

async fn remove_folder(folder: &Path) -> Result<()> {
    if folder.exists() {
        tokio::fs::remove_dir_all(folder)
            .await
            .with_context(|| format!("Failed to remove folder: {}", folder.display()))?;
    }
    Ok(())
}

/// Strip the unique prefix added by [`store_files`]
fn original_name(stored_name: &str) -> &str {
    match stored_name.get(PREFIX_LEN..) {
        Some(rest) if stored_name.as_bytes().get(PREFIX_LEN - 1) == Some(&b'_') => rest,
        _ => stored_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_unique_prefix() {
        let stored = format!("{}_{}", Uuid::new_v4().simple(), "essay.pdf");
        assert_eq!(original_name(&stored), "essay.pdf");
        assert_eq!(original_name("plain.txt"), "plain.txt");
    }

    #[test]
    fn folders_follow_the_action_kind() {
        let files = OfflineFiles::new("/tmp/ws");
        assert_eq!(
            files.submission_folder(3, -100, false),
            PathBuf::from("/tmp/ws/workshop/3/submission/add")
        );
        assert_eq!(
            files.submission_folder(3, 42, true),
            PathBuf::from("/tmp/ws/workshop/3/submission/update_42")
        );
        assert_eq!(
            files.assessment_folder(3, 7),
            PathBuf::from("/tmp/ws/workshop/3/assessment/7")
        );
    }
}
