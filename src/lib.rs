// ABOUTME: Library module for the deckforge program.
// ABOUTME: Builds slide presentations incrementally and renders them to PPTX/PNG.

// Reexport modules
pub mod assemble;
pub mod config;
pub mod errors;
pub mod mutate;
pub mod pptx;
pub mod render;
pub mod schema;
pub mod state;
pub mod tools;

// Reexport common types and functions
pub use assemble::{assemble, DeckGraph};
pub use config::Config;
pub use errors::{DeckError, Result};
pub use mutate::{append_slide, remove_slide_at, replace_slide_at};
pub use pptx::write_pptx;
pub use render::{
    discover_outputs, export_pptx, export_slide_png, export_slides_png, CommandConverter,
    Converter,
};
pub use schema::{PresentationDocument, Slide, TextBlock, TextRun};
pub use state::StateStore;
pub use tools::{ToolResponse, Toolbox};
