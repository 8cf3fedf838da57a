//! Deployment artifact packaging and staging.

use crate::error::{PipelineError, PipelineResult};
use bw_api::ObjectStore;
use std::fs::File;
use std::io::{copy, BufReader, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Compose an object key from a prefix and file name, tolerating prefixes
/// written with or without a trailing slash.
pub fn object_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Zip the given files (flattened to their base names) into `zip_path`.
pub fn zip_files(files: &[PathBuf], zip_path: &Path) -> PipelineResult<PathBuf> {
    let package_err = |message: String| PipelineError::Package {
        path: zip_path.display().to_string(),
        message,
    };

    let file = File::create(zip_path).map_err(|e| PipelineError::IoWithPath {
        path: zip_path.display().to_string(),
        source: e,
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| package_err(format!("'{}' has no file name", path.display())))?;
        log::info!("adding {} to {}", name, zip_path.display());

        writer
            .start_file(name.as_str(), options)
            .map_err(|e| package_err(e.to_string()))?;
        let mut reader = BufReader::new(File::open(path).map_err(|e| {
            PipelineError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }
        })?);
        copy(&mut reader, &mut writer).map_err(|e| package_err(e.to_string()))?;
    }

    writer
        .finish()
        .and_then(|mut f| f.flush().map_err(zip::result::ZipError::Io))
        .map_err(|e| package_err(e.to_string()))?;
    Ok(zip_path.to_path_buf())
}

/// Upload a local file, reporting failure as a boolean instead of aborting
/// the caller: a failed staging upload is logged and the run continues (the
/// operator summary still prints), matching the storage error policy.
pub async fn upload_or_warn(
    store: &dyn ObjectStore,
    bucket: &str,
    expected_owner: &str,
    key: &str,
    local_path: &Path,
) -> bool {
    if let Err(err) = store.check_bucket_owner(bucket, expected_owner).await {
        log::warn!("bucket ownership check failed for '{}': {}", bucket, err);
        println!(
            "The provided bucket doesn't belong to the expected account {}",
            expected_owner
        );
        return false;
    }

    match store.upload_file(bucket, key, local_path).await {
        Ok(()) => {
            println!("File {} uploaded successfully to {}", key, bucket);
            true
        }
        Err(err) => {
            log::warn!("upload of '{}' to '{}' failed: {}", key, bucket, err);
            println!("There was an error uploading file {} to {}", key, bucket);
            false
        }
    }
}

/// Zip the files and stage the archive in the object store; boolean
/// failure reporting as for [`upload_or_warn`].
pub async fn zip_and_upload(
    store: &dyn ObjectStore,
    bucket: &str,
    expected_owner: &str,
    prefix: &str,
    files: &[PathBuf],
    zip_path: &Path,
) -> PipelineResult<bool> {
    let archive = zip_files(files, zip_path)?;
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact.zip".to_string());
    Ok(upload_or_warn(store, bucket, expected_owner, &object_key(prefix, &name), &archive).await)
}

#[cfg(test)]
#[path = "package_test.rs"]
mod tests;
