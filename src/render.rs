// ABOUTME: Rendering pipeline for the deckforge application
// ABOUTME: Drives assemble -> PPTX -> PDF -> raster images via external converters

use crate::assemble::assemble;
use crate::errors::{DeckError, Result};
use crate::mutate::check_index;
use crate::pptx::write_pptx;
use crate::state::StateStore;
use glob;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The two external conversion capabilities, abstracted so the pipeline can
/// be tested against a fake without invoking real binaries.
pub trait Converter {
    /// Convert an office document to a PDF inside `out_dir`, returning the
    /// PDF's path. The returned name carries a random suffix so concurrent
    /// exports of the same presentation cannot collide.
    fn to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf>;

    /// Rasterize one page (zero-based) or all pages of a PDF into `out_dir`
    /// using `stem` as the filename base. Returns the produced image paths
    /// in page order.
    fn rasterize(
        &self,
        pdf: &Path,
        page: Option<usize>,
        out_dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>>;
}

/// Converter backed by LibreOffice (`soffice`) and Poppler (`pdftoppm`).
pub struct CommandConverter {
    pub soffice_path: String,
    pub pdftoppm_path: String,
    pub timeout_ms: u64,
    pub dpi: u32,
}

impl CommandConverter {
    pub fn new(config: &crate::config::Config) -> Self {
        Self {
            soffice_path: config.soffice_path.clone(),
            pdftoppm_path: config.pdftoppm_path.clone(),
            timeout_ms: config.convert_timeout_ms,
            dpi: config.raster_dpi,
        }
    }
}

impl Converter for CommandConverter {
    fn to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf> {
        info!("Converting {:?} to PDF", source);

        let mut cmd = Command::new(&self.soffice_path);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source);
        run_with_timeout(cmd, &self.soffice_path, self.timeout_ms)?;

        // soffice derives the output name from the input stem
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let produced = out_dir.join(format!("{}.pdf", stem));
        if !produced.exists() {
            return Err(DeckError::PathNotFound(produced));
        }

        // rename to a collision-resistant intermediate name
        let unique = out_dir.join(format!("{}-{}.pdf", stem, uuid::Uuid::new_v4()));
        fs::rename(&produced, &unique)?;
        Ok(unique)
    }

    fn rasterize(
        &self,
        pdf: &Path,
        page: Option<usize>,
        out_dir: &Path,
        stem: &str,
    ) -> Result<Vec<PathBuf>> {
        let mut cmd = Command::new(&self.pdftoppm_path);
        cmd.arg("-png").arg("-r").arg(self.dpi.to_string());
        info!("Rasterizing {:?} (page: {:?})", pdf, page);

        match page {
            Some(index) => {
                // pdftoppm pages are one-based; -singlefile fixes the output
                // name to exactly <stem>.png
                let page_num = (index + 1).to_string();
                cmd.arg("-f")
                    .arg(&page_num)
                    .arg("-l")
                    .arg(&page_num)
                    .arg("-singlefile")
                    .arg(pdf)
                    .arg(out_dir.join(stem));
                run_with_timeout(cmd, &self.pdftoppm_path, self.timeout_ms)?;

                let image = out_dir.join(format!("{}.png", stem));
                if !image.exists() {
                    return Err(DeckError::PathNotFound(image));
                }
                Ok(vec![image])
            }
            None => {
                // rasterize under a unique prefix so stale files already in
                // the output directory are never picked up as artifacts of
                // this run, then rename to the deterministic names
                let unique_stem = format!("{}-{}", stem, uuid::Uuid::new_v4());
                let prefix = out_dir.join(&unique_stem);
                cmd.arg(pdf).arg(&prefix);
                run_with_timeout(cmd, &self.pdftoppm_path, self.timeout_ms)?;

                // page numbers are zero-padded to a uniform width per run,
                // so a lexicographic sort is page order
                let pattern = format!("{}-*.png", prefix.to_string_lossy());
                let mut images = Vec::new();
                for produced in discover_outputs(&pattern)? {
                    let file_name = produced
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    let suffix = file_name.strip_prefix(&unique_stem).unwrap_or(&file_name);
                    let image = out_dir.join(format!("{}{}", stem, suffix));
                    fs::rename(&produced, &image)?;
                    images.push(image);
                }
                images.sort();
                Ok(images)
            }
        }
    }
}

/// Find rendered page images matching a glob pattern, sorted.
pub fn discover_outputs(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in (glob::glob(pattern)
        .map_err(|e| DeckError::Pptx(format!("Invalid glob pattern: {}", e))))?
    .flatten()
    {
        paths.push(entry);
    }
    paths.sort();

    if paths.is_empty() {
        return Err(DeckError::NoOutputsFound(pattern.to_string()));
    }
    Ok(paths)
}

/// Run a converter subprocess to completion with a hard deadline. Nonzero
/// exit becomes `ConversionFailed` with captured stderr; exceeding the
/// deadline kills the process and becomes `ConversionTimeout`.
fn run_with_timeout(mut cmd: Command, tool: &str, timeout_ms: u64) -> Result<()> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| DeckError::ConversionFailed {
        tool: tool.to_string(),
        code: "spawn".to_string(),
        stderr: e.to_string(),
    })?;

    // Drain both pipes on their own threads; a converter that writes more
    // than a pipe buffer before exiting would otherwise stall forever.
    let stdout_pipe = child.stdout.take();
    let stdout_reader = std::thread::spawn(move || drain_pipe(stdout_pipe));
    let stderr_pipe = child.stderr.take();
    let stderr_reader = std::thread::spawn(move || drain_pipe(stderr_pipe));

    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("{} exceeded {} ms, killing", tool, timeout_ms);
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_reader.join();
            let _ = stderr_reader.join();
            return Err(DeckError::ConversionTimeout {
                tool: tool.to_string(),
                timeout_ms,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let _ = stdout_reader.join();
    let stderr_bytes = stderr_reader.join().unwrap_or_default();
    if !status.success() {
        return Err(DeckError::ConversionFailed {
            tool: tool.to_string(),
            code: status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
        });
    }
    Ok(())
}

fn drain_pipe(pipe: Option<impl std::io::Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

fn pptx_file_path(name: &str, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}.pptx", name))
}

fn ensure_out_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        fs::create_dir_all(out_dir)?;
    }
    Ok(())
}

/// Delete the intermediate PDF. Failure here must never mask the pipeline's
/// own result, so it only logs.
fn cleanup_pdf(pdf: &Path) {
    if pdf.exists() {
        if let Err(e) = fs::remove_file(pdf) {
            warn!("Failed to remove intermediate PDF {:?}: {}", pdf, e);
        }
    }
}

/// Export a presentation as a PPTX file named `<name>.pptx` in `out_dir`.
pub fn export_pptx(store: &StateStore, name: &str, out_dir: &Path) -> Result<PathBuf> {
    ensure_out_dir(out_dir)?;
    let doc = store.load(name)?;
    let graph = assemble(&doc);
    let output_file = pptx_file_path(name, out_dir);
    write_pptx(&graph, &output_file)?;
    Ok(output_file)
}

/// Export one slide as a PNG named `<name>_slide_<index>.png` in `out_dir`.
/// The index is checked before any conversion work is started.
pub fn export_slide_png(
    store: &StateStore,
    converter: &dyn Converter,
    name: &str,
    index: usize,
    out_dir: &Path,
) -> Result<PathBuf> {
    ensure_out_dir(out_dir)?;
    let doc = store.load(name)?;
    check_index(&doc, index)?;

    let graph = assemble(&doc);
    let pptx_file = pptx_file_path(name, out_dir);
    write_pptx(&graph, &pptx_file)?;

    let pdf = converter.to_pdf(&pptx_file, out_dir)?;
    let stem = format!("{}_slide_{}", name, index);
    let result = converter.rasterize(&pdf, Some(index), out_dir, &stem);
    cleanup_pdf(&pdf);

    let mut images = result?;
    images
        .pop()
        .ok_or_else(|| DeckError::NoOutputsFound(stem))
}

/// Export every slide as PNGs named `<name>_slide-<page>.png` in `out_dir`,
/// returning the paths in page order.
pub fn export_slides_png(
    store: &StateStore,
    converter: &dyn Converter,
    name: &str,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    ensure_out_dir(out_dir)?;
    let doc = store.load(name)?;

    let graph = assemble(&doc);
    let pptx_file = pptx_file_path(name, out_dir);
    write_pptx(&graph, &pptx_file)?;

    let pdf = converter.to_pdf(&pptx_file, out_dir)?;
    let stem = format!("{}_slide", name);
    let result = converter.rasterize(&pdf, None, out_dir, &stem);
    cleanup_pdf(&pdf);

    result
}
