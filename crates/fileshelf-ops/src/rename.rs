//! Name handling for rename and create.

use std::fs;
use std::path::Path;

use fileshelf_core::FileOpError;

/// Remove path separators so the name can only address a single entry.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '/' && !std::path::is_separator(*c))
        .collect()
}

/// Validate a filename for cross-platform compatibility.
pub fn validate_filename(name: &str) -> Result<(), FileOpError> {
    if name.is_empty() {
        return Err(FileOpError::invalid_name(name, "name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(FileOpError::invalid_name(
            name,
            "name is too long (max 255 bytes)",
        ));
    }

    if name.contains('\0') {
        return Err(FileOpError::invalid_name(name, "name cannot contain NUL"));
    }

    #[cfg(target_os = "windows")]
    {
        let windows_invalid = [':', '*', '?', '"', '<', '>', '|'];
        for c in windows_invalid {
            if name.contains(c) {
                return Err(FileOpError::invalid_name(
                    name,
                    format!("name cannot contain '{}'", c),
                ));
            }
        }

        let reserved = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let upper_name = name.to_uppercase();
        let base_name = upper_name.split('.').next().unwrap_or("");
        if reserved.contains(&base_name) {
            return Err(FileOpError::invalid_name(name, "reserved filename"));
        }
    }

    if name.trim().is_empty() {
        return Err(FileOpError::invalid_name(name, "name cannot be blank"));
    }

    if name == "." || name == ".." {
        return Err(FileOpError::invalid_name(
            name,
            "'.' and '..' are reserved names",
        ));
    }

    Ok(())
}

/// Rename `source` to `dest`, which must be free.
pub(crate) fn rename_path(source: &Path, dest: &Path) -> Result<(), FileOpError> {
    fs::rename(source, dest).map_err(|e| FileOpError::io(source, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_valid() {
        assert!(validate_filename("test.txt").is_ok());
        assert!(validate_filename("my-file").is_ok());
        assert!(validate_filename(".hidden").is_ok());
        assert!(validate_filename("file with spaces").is_ok());
    }

    #[test]
    fn test_validate_filename_invalid() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename("   ").is_err());
        assert!(validate_filename(".").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("nul\0byte").is_err());
        assert!(validate_filename(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_sanitize_name_strips_separators() {
        assert_eq!(sanitize_name("../etc/passwd"), "..etcpasswd");
        assert_eq!(sanitize_name("plain.txt"), "plain.txt");
        assert_eq!(sanitize_name("/"), "");
    }
}
