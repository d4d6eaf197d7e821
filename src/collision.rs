//! Collision-free destination names.
//!
//! When `dest_dir/name` is taken, a counter is inserted between stem and
//! extension: `report.pdf`, `report(1).pdf`, `report(2).pdf`, ...
//!
//! This only inspects current filesystem state. The check and the later move
//! are separate steps, so a concurrent writer could still claim the name in
//! between; moves run on a single thread and accept that window.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use tracing::trace;

/// Returns a file name that does not currently exist in `dest_dir`.
///
/// `name` is returned unchanged when it is free. Otherwise the first free
/// `stem(n).ext` with `n >= 1` is returned.
///
/// # Examples
///
/// ```no_run
/// use dirsort::collision::unique_file_name;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// // With "a.png" already present in /dest/images:
/// let name = unique_file_name(Path::new("/dest/images"), OsStr::new("a.png"));
/// assert_eq!(name, "a(1).png");
/// ```
pub fn unique_file_name(dest_dir: &Path, name: &OsStr) -> OsString {
    if !is_taken(&dest_dir.join(name)) {
        return name.to_os_string();
    }

    let base = Path::new(name);
    let stem = base.file_stem().unwrap_or(name);
    let ext = base.extension();

    let mut counter: u64 = 1;
    loop {
        let candidate = numbered_name(stem, ext, counter);
        if !is_taken(&dest_dir.join(&candidate)) {
            trace!(name = ?name, chosen = ?candidate, "resolved name collision");
            return candidate;
        }
        counter += 1;
    }
}

// Dangling symlinks occupy a name too.
fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn numbered_name(stem: &OsStr, ext: Option<&OsStr>, counter: u64) -> OsString {
    let mut out = OsString::from(stem);
    out.push(format!("({})", counter));
    if let Some(ext) = ext {
        out.push(".");
        out.push(ext);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), name).expect("Failed to create file");
    }

    #[test]
    fn test_free_name_is_unchanged() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let name = unique_file_name(temp_dir.path(), OsStr::new("report.pdf"));
        assert_eq!(name, "report.pdf");
    }

    #[test]
    fn test_first_collision_gets_one() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "a.png");

        let name = unique_file_name(temp_dir.path(), OsStr::new("a.png"));
        assert_eq!(name, "a(1).png");
    }

    #[test]
    fn test_counter_skips_taken_names() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "x.txt");
        for n in 1..5 {
            touch(temp_dir.path(), &format!("x({}).txt", n));
        }

        let name = unique_file_name(temp_dir.path(), OsStr::new("x.txt"));
        assert_eq!(name, "x(5).txt");
    }

    #[test]
    fn test_gap_is_filled_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "x.txt");
        touch(temp_dir.path(), "x(2).txt");

        let name = unique_file_name(temp_dir.path(), OsStr::new("x.txt"));
        assert_eq!(name, "x(1).txt");
    }

    #[test]
    fn test_compound_extension_keeps_inner_suffix_in_stem() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "backup.tar.gz");

        let name = unique_file_name(temp_dir.path(), OsStr::new("backup.tar.gz"));
        assert_eq!(name, "backup.tar(1).gz");
    }

    #[test]
    fn test_name_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "Makefile");

        let name = unique_file_name(temp_dir.path(), OsStr::new("Makefile"));
        assert_eq!(name, "Makefile(1)");
    }

    #[test]
    fn test_existing_directory_counts_as_collision() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("a.png")).unwrap();

        let name = unique_file_name(temp_dir.path(), OsStr::new("a.png"));
        assert_eq!(name, "a(1).png");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_counts_as_collision() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::os::unix::fs::symlink(temp_dir.path().join("gone"), temp_dir.path().join("a.png"))
            .unwrap();

        let name = unique_file_name(temp_dir.path(), OsStr::new("a.png"));
        assert_eq!(name, "a(1).png");
    }
}
