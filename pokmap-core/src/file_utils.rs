//! File utility functions.

use crate::error::{MapError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively find files with given extension in a directory.
pub fn find_files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(MapError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file() {
            if let Some(ext) = entry.path().extension() {
                if ext.eq_ignore_ascii_case(extension) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read a map file as UTF-8, falling back to Windows-1252.
///
/// Files that are not valid UTF-8 are older exports with single-byte
/// labels, so stray high bytes never fail the read.
pub fn read_map_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    if let Some(text) = encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(&bytes) {
        return Ok(text.into_owned());
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
    Ok(text.into_owned())
}

/// Where map text comes from.
pub trait MapSource: Send + Sync {
    fn read_map(&self, path: &Path) -> Result<String>;
}

/// Reads map files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl MapSource for FsSource {
    fn read_map(&self, path: &Path) -> Result<String> {
        read_map_text_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_files_with_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.TXT"), "").unwrap();
        fs::write(dir.path().join("c.png"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.txt"), "").unwrap();

        let files = find_files_with_extension(dir.path(), "txt").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.txt", "d.txt"]);
    }

    #[test]
    fn test_find_files_missing_dir() {
        let result = find_files_with_extension(Path::new("/nonexistent/pokmap"), "txt");
        assert!(matches!(result, Err(MapError::Io(_))));
    }

    #[test]
    fn test_read_map_text_utf8_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.txt");
        fs::write(&path, "P 1,2,3,0,0,0,2,Café\n".as_bytes()).unwrap();
        let text = read_map_text_file(&path).unwrap();
        assert!(text.ends_with("Café\n"), "text = {:?}", text);
    }

    #[test]
    fn test_read_map_text_falls_back_for_high_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.txt");
        fs::write(&path, b"P 1,2,3,0,0,0,2,Caf\xe9\n").unwrap();
        let text = read_map_text_file(&path).unwrap();
        assert!(text.ends_with("Café\n"), "text = {:?}", text);
    }

    #[test]
    fn test_fs_source_missing_file_is_io_error() {
        let result = FsSource.read_map(Path::new("/nonexistent/pokmap/map.txt"));
        assert!(matches!(result, Err(MapError::Io(_))));
    }
}
