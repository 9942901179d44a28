//! Ambient config checks that don't belong on `Args` itself: filesystem
//! probes that only make sense right before a real (non-dry-run) run.

use std::path::Path;

/// Checks whether the output path's parent directory exists and is
/// writable, without creating the file itself.
pub fn output_path_writable(path_str: &str) -> Result<(), String> {
    let path = Path::new(path_str);
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !parent.exists() {
        return Err(format!("output directory does not exist: {}", parent.display()));
    }

    let probe = parent.join(format!(".batchgen-write-check-{}", std::process::id()));
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            Ok(())
        }
        Err(source) => Err(format!("no write permission for directory {}: {source}", parent.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_writable_directory_passes() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.jsonl");
        assert!(output_path_writable(output.to_str().unwrap()).is_ok());
    }

    #[test]
    fn missing_directory_fails() {
        let result = output_path_writable("/no/such/directory/out.jsonl");
        assert!(result.is_err());
    }

    #[test]
    fn bare_filename_resolves_to_current_directory() {
        assert!(output_path_writable("out.jsonl").is_ok());
    }
}
