//! Tests for the tree walker
//!
//! Includes the total-coverage check: every regular file under a processed root
//! ends up with exactly one `thumb_<name>.jpg` sibling.

use super::*;
use crate::core::config::AppConfig;
use crate::dispatch::{DispatchMetrics, TracingObserver};
use crate::strategy::{PdfEngine, PdfEngineError, PdfSecurity};
use image::{DynamicImage, ImageBuffer, Rgb};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

struct NoPdf;

impl PdfEngine for NoPdf {
    fn probe(&self, _path: &Path) -> Result<PdfSecurity, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }

    fn render_first_page(&self, _path: &Path, _dpi: f32) -> Result<DynamicImage, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }

    fn extract_text(&self, _path: &Path) -> Result<String, PdfEngineError> {
        Err(PdfEngineError::Unavailable("test".to_string()))
    }
}

fn walker_with(walk: WalkConfig) -> TreeWalker {
    let mut config = AppConfig::default();
    config.tools.ffmpeg = PathBuf::from("true");
    config.tools.converter = Some(PathBuf::from("false"));
    let dispatcher = Dispatcher::from_config(&config, Arc::new(NoPdf), Arc::new(TracingObserver));
    TreeWalker::new(Arc::new(dispatcher), 4, walk)
}

fn walker() -> TreeWalker {
    walker_with(WalkConfig::default())
}

fn write_png(path: &Path) {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(64, 48, |x, y| Rgb([x as u8 * 3, y as u8 * 5, 77]));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Every regular, non-thumbnail file under `dir`
fn source_files(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(d) = stack.pop() {
        for entry in std::fs::read_dir(&d).unwrap() {
            let entry = entry.unwrap();
            let file_type = entry.file_type().unwrap();
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() && !ThumbnailSpec::is_thumbnail_name(&name) {
                out.push(entry.path());
            }
        }
    }
    out
}

fn thumbnail_of(path: &Path) -> PathBuf {
    ThumbnailSpec::output_path(path).unwrap()
}

// ============================================================================
// Walk Tests
// ============================================================================

#[tokio::test]
async fn test_mixed_directory_produces_three_thumbnails() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("photo.png"));
    std::fs::write(dir.path().join("table.csv"), "a,b,c\n1,2,3\n4,5,6\n").unwrap();
    std::fs::write(dir.path().join("noise.bin"), [0u8, 0xFF, 0x10, 0x80, 0x00, 0x7F]).unwrap();

    let summary = walker().walk(dir.path()).await;
    assert_eq!(summary.files, 3);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.fallback, 1);
    assert_eq!(summary.failed, 0);

    for name in ["photo.png", "table.csv", "noise.bin"] {
        let thumb = thumbnail_of(&dir.path().join(name));
        assert_eq!(image::image_dimensions(&thumb).unwrap(), (200, 200), "{}", name);
    }
}

#[tokio::test]
async fn test_every_nested_file_gets_exactly_one_thumbnail() {
    let dir = TempDir::new().unwrap();
    let deep = dir.path().join("a").join("b").join("c");
    std::fs::create_dir_all(&deep).unwrap();
    std::fs::create_dir_all(dir.path().join("empty")).unwrap();
    write_png(&dir.path().join("a").join("top.png"));
    std::fs::write(deep.join("notes.txt"), "plain words without any delimiters").unwrap();
    std::fs::write(dir.path().join("a").join("b").join("data.tsv"), "x\ty\n1\t2\n").unwrap();

    let summary = walker().walk(dir.path()).await;
    assert_eq!(summary.files, 3);

    let sources = source_files(dir.path());
    assert_eq!(sources.len(), 3);
    for source in &sources {
        assert!(thumbnail_of(source).is_file(), "{}", source.display());
    }
}

#[tokio::test]
async fn test_second_walk_skips_generated_thumbnails() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("one.png"));
    write_png(&dir.path().join("two.png"));

    let first = walker().walk(dir.path()).await;
    assert_eq!(first.files, 2);

    let second = walker().walk(dir.path()).await;
    assert_eq!(second.files, 2);
    assert_eq!(second.skipped, 2);
    assert!(!dir.path().join("thumb_thumb_one.png.jpg.jpg").exists());
}

#[tokio::test]
async fn test_generated_thumbnails_processed_when_not_skipping() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("thumb_old.png.jpg"));

    let walk = WalkConfig {
        skip_generated_thumbnails: false,
        ..WalkConfig::default()
    };
    let summary = walker_with(walk).walk(dir.path()).await;
    assert_eq!(summary.files, 1);
    assert_eq!(summary.skipped, 0);
}

#[tokio::test]
async fn test_user_files_with_reserved_looking_names_get_thumbnails() {
    let dir = TempDir::new().unwrap();
    // no `vacation` beside it, so this is a user's photo rather than our output
    write_png(&dir.path().join("thumb_vacation.jpg"));
    write_png(&dir.path().join(".thumb-notes.png"));

    let summary = walker().walk(dir.path()).await;
    assert_eq!(summary.files, 2);
    assert_eq!(summary.skipped, 0);
    assert!(thumbnail_of(&dir.path().join("thumb_vacation.jpg")).is_file());
    assert!(thumbnail_of(&dir.path().join(".thumb-notes.png")).is_file());

    // their own thumbnails are recognised on the next pass
    let again = walker().walk(dir.path()).await;
    assert_eq!(again.files, 2);
    assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn test_single_file_root() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("solo.png");
    write_png(&file);
    write_png(&dir.path().join("sibling.png"));

    let summary = walker().walk(&file).await;
    assert_eq!(summary.files, 1);
    assert!(thumbnail_of(&file).is_file());
    assert!(!thumbnail_of(&dir.path().join("sibling.png")).exists());
}

#[tokio::test]
async fn test_missing_root_is_empty() {
    let dir = TempDir::new().unwrap();
    let summary = walker().walk(&dir.path().join("nope")).await;
    assert_eq!(summary.files, 0);
    assert_eq!(summary.skipped, 0);
    assert!(summary.failures.is_empty());
    assert!(!summary.walk_id.is_nil());
}

#[tokio::test]
async fn test_unlistable_directory_has_no_children() {
    let dir = TempDir::new().unwrap();
    let children = walker().list_directory(&dir.path().join("gone")).await;
    assert!(children.is_empty());
}

#[tokio::test]
async fn test_cancelled_walk_dispatches_nothing() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("a.png"));
    write_png(&dir.path().join("b.png"));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = walker().walk_with_cancel(dir.path(), &cancel).await;
    assert_eq!(summary.files, 0);
    assert_eq!(summary.cancelled, 2);
    assert!(!thumbnail_of(&dir.path().join("a.png")).exists());
}

#[tokio::test]
async fn test_failures_are_listed() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("blob.bin"), [0u8, 1, 2, 3]).unwrap();
    // a directory squatting on the output path makes the placeholder unwritable
    std::fs::create_dir(dir.path().join("thumb_blob.bin.jpg")).unwrap();

    let summary = walker().walk(dir.path()).await;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].output_path, dir.path().join("thumb_blob.bin.jpg"));
}

#[tokio::test]
async fn test_metrics_observer_sees_every_file() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("a.png"));
    std::fs::write(dir.path().join("b.bin"), [0u8, 0xEE]).unwrap();

    let metrics = Arc::new(DispatchMetrics::new());
    let mut config = AppConfig::default();
    config.tools.ffmpeg = PathBuf::from("true");
    let dispatcher = Dispatcher::from_config(&config, Arc::new(NoPdf), metrics.clone());
    let walker = TreeWalker::new(Arc::new(dispatcher), 2, WalkConfig::default());

    walker.walk(dir.path()).await;
    assert_eq!(metrics.total(), 2);
    assert_eq!(metrics.count(OutcomeStatus::Success), 1);
    assert_eq!(metrics.count(OutcomeStatus::Fallback), 1);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::symlink;

    #[tokio::test]
    async fn test_symlinked_directory_not_followed_by_default() {
        let outside = TempDir::new().unwrap();
        write_png(&outside.path().join("elsewhere.png"));

        let dir = TempDir::new().unwrap();
        symlink(outside.path(), dir.path().join("link")).unwrap();

        let summary = walker().walk(dir.path()).await;
        assert_eq!(summary.files, 0);
        assert_eq!(summary.skipped, 1);
        assert!(!thumbnail_of(&outside.path().join("elsewhere.png")).exists());
    }

    #[tokio::test]
    async fn test_symlinked_file_gets_thumbnail_by_default() {
        let dir = TempDir::new().unwrap();
        write_png(&dir.path().join("real.png"));
        symlink(dir.path().join("real.png"), dir.path().join("link.png")).unwrap();
        symlink(dir.path().join("missing.png"), dir.path().join("dangling.png")).unwrap();

        let summary = walker().walk(dir.path()).await;
        assert_eq!(summary.files, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            image::image_dimensions(thumbnail_of(&dir.path().join("link.png"))).unwrap(),
            (200, 200)
        );
        assert!(thumbnail_of(&dir.path().join("real.png")).is_file());
    }

    #[tokio::test]
    async fn test_followed_symlink_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        write_png(&sub.join("pic.png"));
        symlink(dir.path(), sub.join("back")).unwrap();

        let walk = WalkConfig {
            follow_symlinks: true,
            ..WalkConfig::default()
        };
        let summary = walker_with(walk).walk(dir.path()).await;
        assert_eq!(summary.files, 1);
        assert!(thumbnail_of(&sub.join("pic.png")).is_file());
    }
}
