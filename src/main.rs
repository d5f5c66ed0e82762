use anyhow::{bail, Context, Result};
use clap::Parser;
use pdf_outline::pdf_source::open_pdf;
use pdf_outline::{Outline, OutlineBuilder, OutlineConfig};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pdf-outline", about = "Extract a title and H1-H3 outline from PDF files")]
struct Args {
    /// PDF file, or a directory of PDF files
    #[arg(short, long)]
    input: PathBuf,
    /// JSON output file, or output directory when the input is a directory
    #[arg(short, long)]
    output: PathBuf,
    /// JSON file overriding the heuristic tuning parameters
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Minimum score for a line to count as a heading
    #[arg(long)]
    acceptance_threshold: Option<f32>,
    /// Pages a line must repeat on to be treated as a running header/footer
    #[arg(long)]
    repeat_min_pages: Option<usize>,
    /// Use the document's metadata title instead of the inferred one
    #[arg(long)]
    prefer_metadata_title: bool,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let builder = OutlineBuilder::new(load_config(&args)?);

    if args.input.is_dir() {
        process_dir(&builder, &args.input, &args.output)
    } else {
        process_file(&builder, &args.input, &args.output)
            .with_context(|| format!("Failed to process {}", args.input.display()))
    }
}

fn load_config(args: &Args) -> Result<OutlineConfig> {
    let mut config = match &args.config {
        Some(path) => OutlineConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OutlineConfig::default(),
    };
    if let Some(threshold) = args.acceptance_threshold {
        config.scoring.acceptance_threshold = threshold;
    }
    if let Some(pages) = args.repeat_min_pages {
        config.noise.repeat_min_pages = pages;
    }
    if args.prefer_metadata_title {
        config.title.prefer_metadata = true;
    }
    config.validate()?;
    Ok(config)
}

fn process_file(builder: &OutlineBuilder, input: &Path, output: &Path) -> Result<()> {
    log::info!("Processing {}", input.display());
    let source = open_pdf(input)?;
    let outline = builder.build(&source)?;
    write_outline(&outline, output)?;
    log::info!("Wrote {} ({} entries)", output.display(), outline.entries.len());
    Ok(())
}

/// Every document is independent; one failure does not stop the rest.
fn process_dir(builder: &OutlineBuilder, input: &Path, output: &Path) -> Result<()> {
    let pdfs = collect_pdfs(input)?;
    if pdfs.is_empty() {
        log::warn!("No PDF files found in {}", input.display());
        return Ok(());
    }
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    log::info!("Found {} PDF(s) in {}", pdfs.len(), input.display());

    let failures = pdfs
        .par_iter()
        .filter(|pdf| {
            let target = output_path_for(pdf, output);
            match process_file(builder, pdf, &target) {
                Ok(()) => false,
                Err(e) => {
                    log::error!("Failed to process {}: {:#}", pdf.display(), e);
                    true
                }
            }
        })
        .count();

    if failures > 0 {
        bail!("{} of {} documents failed", failures, pdfs.len());
    }
    Ok(())
}

fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if path.is_file() && is_pdf {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

fn output_path_for(pdf: &Path, output_dir: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output_dir.join(format!("{stem}.json"))
}

fn write_outline(outline: &Outline, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, serde_json::to_string_pretty(outline)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
