//! Picklist export for planned protocols.

use std::path::Path;

use lh_picklist::{ExportManifest, PicklistStore, group_transfer_lists};
use lh_transfer::Protocol;

use crate::error::AppResult;

/// Write the protocol's picklists and manifest into `out_dir`.
pub fn export_picklists(
    protocol: &Protocol,
    out_dir: &Path,
    merge_plate_types: bool,
) -> AppResult<ExportManifest> {
    let picklists = group_transfer_lists(protocol.transfer_lists(), merge_plate_types);
    let store = PicklistStore::new(out_dir.to_path_buf())?;
    Ok(store.write(protocol.title(), &picklists, merge_plate_types)?)
}

/// Read back the manifest of a previous export.
pub fn load_export(out_dir: &Path) -> AppResult<ExportManifest> {
    let store = PicklistStore::new(out_dir.to_path_buf())?;
    Ok(store.load_manifest()?)
}

/// Files of a previous export whose contents no longer match the manifest.
pub fn modified_files(out_dir: &Path) -> AppResult<Vec<String>> {
    let store = PicklistStore::new(out_dir.to_path_buf())?;
    let manifest = store.load_manifest()?;
    let mut modified = Vec::new();
    for entry in &manifest.files {
        if !store.verify(entry)? {
            modified.push(entry.file.clone());
        }
    }
    Ok(modified)
}
