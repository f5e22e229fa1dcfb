//! Picklist export directory.
//!
//! Layout of an export:
//! - one `<stem>.csv` per picklist
//! - `manifest.json` listing every file with its SHA-256 digest

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::group::Picklist;
use crate::record::PicklistRecord;
use crate::{PicklistError, PicklistResult};

const MANIFEST: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub title: String,
    pub timestamp: String,
    pub merged_plate_types: bool,
    pub files: Vec<ExportedFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file: String,
    pub plate_type: String,
    pub source_plates: Vec<String>,
    pub transfers: usize,
    pub total_volume_nl: u64,
    pub sha256: String,
}

/// Serialize a picklist to CSV, header first.
pub fn to_csv_bytes(picklist: &Picklist) -> PicklistResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    if picklist.records.is_empty() {
        writer.write_record(crate::record::HEADER)?;
    }
    for record in &picklist.records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| PicklistError::Io(e.into_error()))
}

#[derive(Clone)]
pub struct PicklistStore {
    root_dir: PathBuf,
}

impl PicklistStore {
    pub fn new(root_dir: PathBuf) -> PicklistResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Write every picklist and the manifest describing them.
    pub fn write(
        &self,
        title: &str,
        picklists: &[Picklist],
        merged_plate_types: bool,
    ) -> PicklistResult<ExportManifest> {
        let mut files = Vec::with_capacity(picklists.len());
        for picklist in picklists {
            let bytes = to_csv_bytes(picklist)?;
            let file = format!("{}.csv", picklist.stem);
            fs::write(self.root_dir.join(&file), &bytes)?;
            files.push(ExportedFile {
                file,
                plate_type: picklist.plate_type.clone(),
                source_plates: picklist.source_plates.clone(),
                transfers: picklist.records.len(),
                total_volume_nl: picklist.total_volume_nl(),
                sha256: format!("{:x}", Sha256::digest(&bytes)),
            });
        }

        let manifest = ExportManifest {
            title: title.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            merged_plate_types,
            files,
        };
        let manifest_json = serde_json::to_string_pretty(&manifest)?;
        fs::write(self.root_dir.join(MANIFEST), manifest_json)?;
        info!(
            dir = %self.root_dir.display(),
            files = manifest.files.len(),
            "picklists written"
        );
        Ok(manifest)
    }

    pub fn load_manifest(&self) -> PicklistResult<ExportManifest> {
        let path = self.root_dir.join(MANIFEST);
        if !path.exists() {
            return Err(PicklistError::NotFound {
                file: MANIFEST.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn read(&self, file: &str) -> PicklistResult<Vec<PicklistRecord>> {
        let path = self.root_dir.join(file);
        if !path.exists() {
            return Err(PicklistError::NotFound {
                file: file.to_string(),
            });
        }
        let mut reader = csv::ReaderBuilder::new().from_path(path)?;
        let records = reader.deserialize().collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Recompute a file's digest and compare it with the manifest.
    pub fn verify(&self, entry: &ExportedFile) -> PicklistResult<bool> {
        let bytes = fs::read(self.root_dir.join(&entry.file))?;
        Ok(format!("{:x}", Sha256::digest(&bytes)) == entry.sha256)
    }
}
