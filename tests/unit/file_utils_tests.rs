/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use amarelo::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

#[test]
fn test_dir_exists_withNonExistentDir_shouldReturnFalse() {
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));
}

/// Test that generate_output_path creates the correct path
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(
        Path::new("/tmp/input/video.mkv"),
        Path::new("/tmp/output"),
        "_Amarelo",
        "srt",
    );

    assert_eq!(output_path, Path::new("/tmp/output/video_Amarelo.srt"));
}

#[test]
fn test_generate_output_path_withDottedName_shouldOnlyDropLastExtension() {
    let output_path = FileManager::generate_output_path("show.s01e01.mp4", "out", "_Amarelo", "ass");

    assert_eq!(output_path, Path::new("out/show.s01e01_Amarelo.ass"));
}

#[test]
fn test_is_video_file_withExtensions_shouldIgnoreCase() {
    assert!(FileManager::is_video_file("a.mp4"));
    assert!(FileManager::is_video_file("a.MKV"));
    assert!(FileManager::is_video_file("a.Wmv"));
    assert!(!FileManager::is_video_file("a.srt"));
    assert!(!FileManager::is_video_file("mp4"));
}

#[test]
fn test_find_videos_withMixedFiles_shouldReturnSortedVideosOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_video(dir, "b.mkv")?;
    common::create_test_video(dir, "a.MP4")?;
    common::create_test_file(dir, "notes.txt", "x")?;
    common::create_test_subtitle(dir, "a.srt")?;
    fs::create_dir(dir.join("nested"))?;
    common::create_test_video(&dir.join("nested"), "c.mp4")?;

    let videos = FileManager::find_videos(dir)?;

    assert_eq!(videos, vec![dir.join("a.MP4"), dir.join("b.mkv")]);
    Ok(())
}

#[test]
fn test_find_sibling_subtitle_withSeveralFormats_shouldPreferSrt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let video = common::create_test_video(dir, "movie.mp4")?;
    common::create_test_file(dir, "movie.vtt", "WEBVTT\n")?;
    common::create_test_file(dir, "movie.ass", "[Events]\n")?;

    assert_eq!(FileManager::find_sibling_subtitle(&video), Some(dir.join("movie.ass")));

    common::create_test_subtitle(dir, "movie.srt")?;
    assert_eq!(FileManager::find_sibling_subtitle(&video), Some(dir.join("movie.srt")));
    Ok(())
}

#[test]
fn test_find_sibling_subtitle_withOtherBasename_shouldReturnNone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    let video = common::create_test_video(dir, "movie.mp4")?;
    common::create_test_subtitle(dir, "other.srt")?;

    assert_eq!(FileManager::find_sibling_subtitle(&video), None);
    Ok(())
}

#[test]
fn test_resolve_output_dir_withAbsolutePath_shouldKeepIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;

    assert_eq!(FileManager::resolve_output_dir(temp_dir.path())?, temp_dir.path());
    assert!(FileManager::resolve_output_dir("output")?.is_absolute());
    Ok(())
}

#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("a").join("b").join("out.srt");

    FileManager::write_to_file(&path, "content")?;

    assert_eq!(fs::read_to_string(&path)?, "content");
    Ok(())
}
