use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Video extensions picked up by a directory scan
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "avi", "mov", "wmv"];

/// Sibling subtitle extensions, in discovery priority order
pub const SUBTITLE_EXTENSIONS: [&str; 3] = ["srt", "ass", "vtt"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @checks: Video extension, case-insensitive
    pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    /// List the video files directly inside `dir`, sorted by file name
    pub fn find_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut videos = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::is_video_file(path) {
                videos.push(path.to_path_buf());
            }
        }

        videos.sort();
        Ok(videos)
    }

    /// Find `<basename>.srt`, `.ass` or `.vtt` next to the video, first match wins
    pub fn find_sibling_subtitle<P: AsRef<Path>>(video_path: P) -> Option<PathBuf> {
        let video_path = video_path.as_ref();
        let stem = video_path.file_stem()?;
        let dir = video_path.parent().unwrap_or_else(|| Path::new(""));

        SUBTITLE_EXTENSIONS.iter()
            .map(|ext| {
                let mut name = stem.to_os_string();
                name.push(".");
                name.push(ext);
                dir.join(name)
            })
            .find(|candidate| candidate.is_file())
    }

    /// Resolve the output directory; relative paths are taken from the working directory
    pub fn resolve_output_dir<P: AsRef<Path>>(output_dir: P) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        if output_dir.is_absolute() {
            return Ok(output_dir.to_path_buf());
        }
        let cwd = env::current_dir().context("Failed to read the working directory")?;
        Ok(cwd.join(output_dir))
    }

    // @generates: Output path for a video's styled subtitle
    // @params: video, output_dir, suffix, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        video_path: P1,
        output_dir: P2,
        suffix: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = video_path.as_ref().file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push_str(suffix);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.as_ref().join(output_filename)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                Self::ensure_dir(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
