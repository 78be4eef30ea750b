//! Folder listing helpers shared by the job variants.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::{AnalyzeError, AnalyzeResult};

/// Image extensions tried for loose image-sequence folders, in order.
pub const IMAGE_EXTENSIONS: &[&str] = &["tga", "png", "jpg", "jpeg"];

/// Audio extensions tried for a folder's attached audio, in order.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav"];

/// Check a file name's extension (without dot), ignoring case.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Case-insensitive name order; names equal but for case keep byte order.
fn sort_by_name(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| (name_of(p).to_lowercase(), p.clone()));
}

/// Files directly in `folder` with the given extension, sorted by name
/// ignoring case.
pub fn list_files(folder: &Path, extension: &str) -> AnalyzeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|e| AnalyzeError::read_dir(folder, e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();
    sort_by_name(&mut files);
    Ok(files)
}

/// Sub-folders directly in `folder`, sorted by name ignoring case.
pub fn list_folders(folder: &Path) -> AnalyzeResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|e| AnalyzeError::read_dir(folder, e))?;

    let mut folders: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    sort_by_name(&mut folders);
    Ok(folders)
}

/// First audio file in `folder`, trying [`AUDIO_EXTENSIONS`] in order.
pub fn first_audio_file(folder: &Path) -> AnalyzeResult<Option<PathBuf>> {
    for extension in AUDIO_EXTENSIONS {
        if let Some(first) = list_files(folder, extension)?.into_iter().next() {
            return Ok(Some(first));
        }
    }
    Ok(None)
}

/// Last path component as a string.
pub fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Where a job's outputs go: the override folder, or `default_dir`.
pub fn output_dir(settings: &crate::config::OutputSettings, default_dir: &Path) -> PathBuf {
    if settings.same_folder_for_all && !settings.output_folder.trim().is_empty() {
        PathBuf::from(settings.output_folder.trim())
    } else {
        default_dir.to_path_buf()
    }
}

/// Parent folder, or the current directory for bare names.
pub fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
