use deckforge::schema::{Slide, TextBlock, TextRun};
use deckforge::{Config, DeckError, Converter, Result, StateStore, Toolbox};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn text_slide(text: &str) -> Slide {
    Slide {
        texts: Some(vec![TextBlock::Run(TextRun {
            text: text.to_string(),
            options: None,
        })]),
        ..Default::default()
    }
}

/// Stand-in for the external converters: writes placeholder artifacts with
/// the pipeline's expected naming, and counts invocations.
struct FakeConverter {
    pages: usize,
    to_pdf_calls: AtomicUsize,
    rasterize_calls: AtomicUsize,
    fail_rasterize: bool,
}

impl FakeConverter {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            to_pdf_calls: AtomicUsize::new(0),
            rasterize_calls: AtomicUsize::new(0),
            fail_rasterize: false,
        }
    }
}

impl Converter for FakeConverter {
    fn to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        self.to_pdf_calls.fetch_add(1, Ordering::SeqCst);
        assert!(source.exists(), "pipeline must serialize the PPTX first");
        let pdf = out_dir.join("intermediate.pdf");
        fs::write(&pdf, b"%PDF-fake")?;
        Ok(pdf)
    }

    fn rasterize(
        &self,
        pdf: &Path,
        page: Option<usize>,
        out_dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>> {
        self.rasterize_calls.fetch_add(1, Ordering::SeqCst);
        assert!(pdf.exists(), "PDF must exist when rasterizing");
        if self.fail_rasterize {
            return Err(DeckError::ConversionFailed {
                tool: "fake".to_string(),
                code: "1".to_string(),
                stderr: "boom".to_string(),
            });
        }
        match page {
            Some(_) => {
                let image = out_dir.join(format!("{}.png", stem));
                fs::write(&image, b"png")?;
                Ok(vec![image])
            }
            None => {
                let mut images = Vec::new();
                for p in 1..=self.pages {
                    let image = out_dir.join(format!("{}-{}.png", stem, p));
                    fs::write(&image, b"png")?;
                    images.push(image);
                }
                Ok(images)
            }
        }
    }
}

fn setup(pages: usize) -> (TempDir, Toolbox<FakeConverter>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::with_storage_dir(dir.path());
    let toolbox = Toolbox::with_converter(&config, FakeConverter::new(pages));
    (dir, toolbox)
}

#[test]
fn test_export_slide_out_of_range_skips_conversion() {
    let (dir, toolbox) = setup(2);
    let name = "deck-b";
    assert!(!toolbox.create_presentation(name, None, None, false).is_error);
    assert!(!toolbox.add_slide(name, text_slide("one")).is_error);
    assert!(!toolbox.add_slide(name, text_slide("two")).is_error);

    let out_dir = dir.path().join("out");
    let response = toolbox.export_slide_as_png(name, 5, &out_dir);
    assert!(response.is_error);
    assert!(response.text.contains("out of range"), "got: {}", response.text);

    // the index check happens before any subprocess work
    assert_eq!(toolbox.converter().to_pdf_calls.load(Ordering::SeqCst), 0);
    assert_eq!(toolbox.converter().rasterize_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_export_all_slides_returns_ordered_paths_and_cleans_up() {
    let (dir, toolbox) = setup(3);
    let name = "deck-c";
    assert!(!toolbox.create_presentation(name, None, None, false).is_error);
    for i in 0..3 {
        assert!(!toolbox.add_slide(name, text_slide(&format!("slide {}", i))).is_error);
    }

    let out_dir = dir.path().join("out");
    let response = toolbox.export_slides_as_png(name, &out_dir);
    assert!(!response.is_error, "got: {}", response.text);

    let mut listed: Vec<String> = response
        .text
        .lines()
        .skip(1)
        .map(|l| l.to_string())
        .collect();
    assert_eq!(listed.len(), 3);
    listed.dedup();
    assert_eq!(listed.len(), 3, "paths must be distinct");
    for path in &listed {
        assert!(Path::new(path).exists(), "missing artifact: {}", path);
    }

    // no intermediate PDF left behind
    let leftovers: Vec<_> = fs::read_dir(&out_dir)
        .expect("Failed to read output dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "pdf"))
        .collect();
    assert!(leftovers.is_empty(), "leftover PDFs: {:?}", leftovers);
}

#[test]
fn test_export_single_slide_artifact_name() {
    let (dir, toolbox) = setup(2);
    let name = "deck-single";
    assert!(!toolbox.create_presentation(name, None, None, false).is_error);
    assert!(!toolbox.add_slide(name, text_slide("one")).is_error);
    assert!(!toolbox.add_slide(name, text_slide("two")).is_error);

    let out_dir = dir.path().join("out");
    let response = toolbox.export_slide_as_png(name, 1, &out_dir);
    assert!(!response.is_error, "got: {}", response.text);
    assert!(
        response.text.contains("deck-single_slide_1.png"),
        "got: {}",
        response.text
    );
}

#[test]
fn test_rasterize_failure_surfaces_and_cleans_up_pdf() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::with_storage_dir(dir.path());
    let mut converter = FakeConverter::new(1);
    converter.fail_rasterize = true;
    let toolbox = Toolbox::with_converter(&config, converter);

    let name = "deck-fail";
    assert!(!toolbox.create_presentation(name, None, None, false).is_error);
    assert!(!toolbox.add_slide(name, text_slide("one")).is_error);

    let out_dir = dir.path().join("out");
    let response = toolbox.export_slide_as_png(name, 0, &out_dir);
    assert!(response.is_error);
    assert!(response.text.contains("boom"), "got: {}", response.text);
    assert!(
        !out_dir.join("intermediate.pdf").exists(),
        "intermediate PDF must be removed even on failure"
    );
}

#[test]
fn test_export_of_missing_presentation_is_not_found() {
    let (dir, toolbox) = setup(1);
    let response = toolbox.export_presentation_as_pptx("ghost", &dir.path().join("out"));
    assert!(response.is_error);
    assert!(response.text.contains("not found"), "got: {}", response.text);
}

#[test]
fn test_concurrent_add_slide_is_serialized_per_name() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config::with_storage_dir(dir.path());
    let toolbox = Toolbox::with_converter(&config, FakeConverter::new(0));
    let name = "deck-d";
    assert!(!toolbox.create_presentation(name, None, None, false).is_error);

    const WRITERS: usize = 8;
    std::thread::scope(|scope| {
        for i in 0..WRITERS {
            let toolbox = &toolbox;
            scope.spawn(move || {
                let response = toolbox.add_slide(name, text_slide(&format!("slide {}", i)));
                assert!(!response.is_error, "got: {}", response.text);
            });
        }
    });

    let store = StateStore::new(&config);
    let doc = store.load(name).expect("load failed");
    assert_eq!(doc.slides.len(), WRITERS, "no append may be lost");
}
