// ABOUTME: Main entry point for the deckforge program.
// ABOUTME: Exposes the tool operations as CLI subcommands.

use clap::{Args, Parser, Subcommand};
use deckforge::schema::Slide;
use deckforge::{Config, ToolResponse, Toolbox};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new presentation
    CreatePresentation(CreateArgs),

    /// Append a slide to a presentation
    AddSlide(SlideContentArgs),

    /// Replace the slide at an index
    ReplaceSlide(ReplaceArgs),

    /// Remove the slide at an index
    RemoveSlide(IndexArgs),

    /// Print one slide as JSON
    GetSlide(IndexArgs),

    /// Print all slides as JSON
    GetSlides(NameArgs),

    /// Export the presentation as a PPTX file
    ExportPresentationAsPptx(ExportArgs),

    /// Export one slide as a PNG image
    ExportSlideAsPng(ExportSlideArgs),

    /// Export every slide as PNG images
    ExportSlidesAsPng(ExportArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Presentation name, used as the storage key
    #[arg(short, long)]
    name: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    /// Overwrite an existing presentation with the same name
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct NameArgs {
    #[arg(short, long)]
    name: String,
}

#[derive(Args)]
struct SlideContentArgs {
    #[arg(short, long)]
    name: String,

    /// Slide content as JSON (background, color, slideNumber, texts)
    #[arg(short, long, default_value = "{}")]
    slide: String,
}

#[derive(Args)]
struct ReplaceArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short = 'i', long)]
    slide_index: usize,

    /// Slide content as JSON (background, color, slideNumber, texts)
    #[arg(short, long, default_value = "{}")]
    slide: String,
}

#[derive(Args)]
struct IndexArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short = 'i', long)]
    slide_index: usize,
}

#[derive(Args)]
struct ExportArgs {
    #[arg(short, long)]
    name: String,

    /// Output directory, created if absent
    #[arg(short, long)]
    out_dir: PathBuf,
}

#[derive(Args)]
struct ExportSlideArgs {
    #[arg(short, long)]
    name: String,

    #[arg(short = 'i', long)]
    slide_index: usize,

    /// Output directory, created if absent
    #[arg(short, long)]
    out_dir: PathBuf,
}

fn parse_slide(json: &str) -> Result<Slide, ToolResponse> {
    serde_json::from_str(json).map_err(|e| ToolResponse {
        text: format!("Failed to parse slide JSON: {}", e),
        is_error: true,
    })
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let toolbox = Toolbox::new(&config);

    let response = match &cli.command {
        Commands::CreatePresentation(args) => toolbox.create_presentation(
            &args.name,
            args.title.clone(),
            args.subject.clone(),
            args.force,
        ),
        Commands::AddSlide(args) => match parse_slide(&args.slide) {
            Ok(slide) => toolbox.add_slide(&args.name, slide),
            Err(response) => response,
        },
        Commands::ReplaceSlide(args) => match parse_slide(&args.slide) {
            Ok(slide) => toolbox.replace_slide(&args.name, args.slide_index, slide),
            Err(response) => response,
        },
        Commands::RemoveSlide(args) => toolbox.remove_slide(&args.name, args.slide_index),
        Commands::GetSlide(args) => toolbox.get_slide(&args.name, args.slide_index),
        Commands::GetSlides(args) => toolbox.get_slides(&args.name),
        Commands::ExportPresentationAsPptx(args) => {
            toolbox.export_presentation_as_pptx(&args.name, &args.out_dir)
        }
        Commands::ExportSlideAsPng(args) => {
            toolbox.export_slide_as_png(&args.name, args.slide_index, &args.out_dir)
        }
        Commands::ExportSlidesAsPng(args) => {
            toolbox.export_slides_as_png(&args.name, &args.out_dir)
        }
    };

    if response.is_error {
        eprintln!("Error: {}", response.text);
        std::process::exit(1);
    }
    println!("{}", response.text);
}
