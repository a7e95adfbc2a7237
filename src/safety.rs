//! Output path checks so a converted list never clobbers its inputs.
//!
//! The input ID list is often a `.txt` file next to the catalog caches, and
//! the output is also a `.txt` file, so a typo could overwrite either.

use anyhow::{bail, Result};
use std::path::Path;

/// Extension every converted list must carry.
pub const OUTPUT_EXTENSION: &str = "txt";

/// Whether two paths point at the same file. Existing files are compared
/// after canonicalization; otherwise the paths are compared as given.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Validates that an output path is safe to overwrite.
///
/// Checks:
/// - Output must be a `.txt` file and not an existing directory
/// - Output cannot be any of the protected paths (catalog caches, input list)
pub fn validate_output_path(output: &Path, protected: &[&Path]) -> Result<()> {
    if output.is_dir() {
        bail!(
            "Safety check failed: output '{}' is a directory",
            output.display()
        );
    }

    let has_extension = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION));
    if !has_extension {
        bail!(
            "Safety check failed: output file '{}' must end in '.{}'",
            output.display(),
            OUTPUT_EXTENSION
        );
    }

    for path in protected {
        if same_file(output, path) {
            bail!(
                "Safety check failed: output '{}' cannot be the same as input '{}'",
                output.display(),
                path.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_valid_output() {
        let output = PathBuf::from("converted_wd_list.txt");
        let cache = PathBuf::from("wannadance.json");
        assert!(validate_output_path(&output, &[&cache]).is_ok());
    }

    #[test]
    fn test_wrong_extension() {
        let output = PathBuf::from("pypydance.json");
        let result = validate_output_path(&output, &[]);
        assert!(result.unwrap_err().to_string().contains("must end in '.txt'"));
    }

    #[test]
    fn test_output_equals_input_list() {
        let path = PathBuf::from("favorites.txt");
        let result = validate_output_path(&path, &[&path]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as input"));
    }

    #[test]
    fn test_output_equals_input_via_different_spelling() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("favorites.txt");
        fs::write(&input, "1,2").unwrap();
        let spelled = dir.path().join(".").join("favorites.txt");
        assert!(validate_output_path(&spelled, &[&input]).is_err());
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.txt");
        fs::create_dir(&output).unwrap();
        assert!(validate_output_path(&output, &[]).is_err());
    }
}
