//! Locate exported thumbnails and preview videos for a shot.
//!
//! Export presets write media either flat (`{dir}/{shot}.jpg`) or in one
//! folder per sequence (`{dir}/{sequence}/{shot}.jpg`), sometimes with a
//! frame-number suffix. Lookups go from most to least specific and return
//! the first match; matches within a stage are sorted so the result is
//! deterministic.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Still image extension written by the thumbnail preset.
pub const THUMBNAIL_EXTENSION: &str = "jpg";

/// Video extensions written by the review presets, in preference order.
pub const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4"];

/// Frame-number suffixes appended by still exports.
const FRAME_SUFFIXES: &[&str] = &["", ".0001", ".00000001"];

/// Files exactly `depth` levels below `dir`, sorted by path.
fn files_at_depth(dir: &Path, depth: usize) -> Vec<PathBuf> {
    files_between(dir, depth, depth)
}

fn files_between(dir: &Path, min_depth: usize, max_depth: usize) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(min_depth)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn first_match(files: &[PathBuf], pred: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    files.iter().find(|p| pred(p)).cloned()
}

/// Find the thumbnail exported for `shot_name` under `dir`.
pub fn find_thumbnail(dir: &Path, shot_name: &str) -> Option<PathBuf> {
    if shot_name.is_empty() || !dir.is_dir() {
        return None;
    }

    let exact: Vec<String> = FRAME_SUFFIXES
        .iter()
        .map(|suffix| format!("{shot_name}{suffix}.{THUMBNAIL_EXTENSION}"))
        .collect();
    let is_exact = |p: &Path| exact.iter().any(|name| file_name(p) == name);
    let is_prefixed =
        |p: &Path| file_name(p).starts_with(shot_name) && has_extension(p, THUMBNAIL_EXTENSION);

    let flat = files_at_depth(dir, 1);
    let nested = files_at_depth(dir, 2);

    // Exact names win over frame-suffixed ones, flat layout over nested.
    for name in &exact {
        if let Some(found) = first_match(&flat, |p| file_name(p) == name) {
            return Some(found);
        }
    }
    first_match(&nested, is_exact)
        .or_else(|| first_match(&flat, is_prefixed))
        .or_else(|| first_match(&nested, is_prefixed))
        .or_else(|| first_match(&files_between(dir, 3, usize::MAX), is_prefixed))
}

/// Find the preview video exported for `shot_name` under `dir`.
pub fn find_video(dir: &Path, shot_name: &str) -> Option<PathBuf> {
    if shot_name.is_empty() || !dir.is_dir() {
        return None;
    }

    let flat = files_at_depth(dir, 1);
    let nested = files_at_depth(dir, 2);

    // The review preset writes `{sequence}/{shot}.ext`, so nested is tried first.
    for files in [&nested, &flat] {
        for ext in VIDEO_EXTENSIONS {
            let exact = format!("{shot_name}.{ext}");
            if let Some(found) = first_match(files, |p| file_name(p) == exact) {
                return Some(found);
            }
        }
    }
    for files in [&nested, &flat] {
        for ext in VIDEO_EXTENSIONS {
            if let Some(found) =
                first_match(files, |p| file_name(p).starts_with(shot_name) && has_extension(p, ext))
            {
                return Some(found);
            }
        }
    }

    let deep = files_between(dir, 1, usize::MAX);
    VIDEO_EXTENSIONS.iter().find_map(|ext| {
        first_match(&deep, |p| file_name(p).contains(shot_name) && has_extension(p, ext))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn thumbnail_exact_flat_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SH010.jpg"));
        touch(&dir.path().join("SH010.0001.jpg"));
        assert_eq!(
            find_thumbnail(dir.path(), "SH010"),
            Some(dir.path().join("SH010.jpg"))
        );
    }

    #[test]
    fn thumbnail_frame_suffix_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SH010.00000001.jpg"));
        assert_eq!(
            find_thumbnail(dir.path(), "SH010"),
            Some(dir.path().join("SH010.00000001.jpg"))
        );
    }

    #[test]
    fn thumbnail_in_sequence_folder() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SEQ010").join("SH020.jpg"));
        assert_eq!(
            find_thumbnail(dir.path(), "SH020"),
            Some(dir.path().join("SEQ010").join("SH020.jpg"))
        );
    }

    #[test]
    fn thumbnail_deep_prefix_match() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("SH030_v002.jpg");
        touch(&deep);
        assert_eq!(find_thumbnail(dir.path(), "SH030"), Some(deep));
    }

    #[test]
    fn thumbnail_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SH010.png"));
        assert!(find_thumbnail(dir.path(), "SH010").is_none());
    }

    #[test]
    fn missing_directory_returns_none() {
        assert!(find_thumbnail(Path::new("/nonexistent/thumbs"), "SH010").is_none());
        assert!(find_video(Path::new("/nonexistent/videos"), "SH010").is_none());
    }

    #[test]
    fn video_prefers_nested_mov() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SH010.mp4"));
        touch(&dir.path().join("SEQ010").join("SH010.mov"));
        assert_eq!(
            find_video(dir.path(), "SH010"),
            Some(dir.path().join("SEQ010").join("SH010.mov"))
        );
    }

    #[test]
    fn video_flat_mp4() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("SH040.mp4"));
        assert_eq!(
            find_video(dir.path(), "SH040"),
            Some(dir.path().join("SH040.mp4"))
        );
    }

    #[test]
    fn video_recursive_contains_match() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("x").join("y").join("proj_SH050_comp.mov");
        touch(&deep);
        assert_eq!(find_video(dir.path(), "SH050"), Some(deep));
    }
}
