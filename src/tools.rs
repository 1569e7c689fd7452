// ABOUTME: Tool surface exposing each capability as a named operation
// ABOUTME: Wraps every outcome in a uniform success/error response

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::mutate::{append_slide, check_index, remove_slide_at, replace_slide_at};
use crate::render::{export_pptx, export_slide_png, export_slides_png, CommandConverter, Converter};
use crate::schema::{validate_slide, Slide};
use crate::state::{name_lock, StateStore};
use std::path::Path;

/// Uniform result envelope: a human-readable confirmation or an error
/// message naming the failed stage. No operation returns a partial success.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    fn ok(text: String) -> Self {
        Self {
            text,
            is_error: false,
        }
    }

    fn fail(stage: &str, err: DeckError) -> Self {
        Self {
            text: format!("Failed to {}: {}", stage, err),
            is_error: true,
        }
    }
}

fn respond(stage: &str, result: Result<String>) -> ToolResponse {
    match result {
        Ok(text) => ToolResponse::ok(text),
        Err(err) => ToolResponse::fail(stage, err),
    }
}

/// The nine named operations over one storage root.
pub struct Toolbox<C: Converter = CommandConverter> {
    store: StateStore,
    converter: C,
}

impl Toolbox<CommandConverter> {
    pub fn new(config: &Config) -> Self {
        Self {
            store: StateStore::new(config),
            converter: CommandConverter::new(config),
        }
    }
}

impl<C: Converter> Toolbox<C> {
    /// Build a toolbox around a custom converter; used by tests to avoid
    /// the real external binaries.
    pub fn with_converter(config: &Config, converter: C) -> Self {
        Self {
            store: StateStore::new(config),
            converter,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn create_presentation(
        &self,
        name: &str,
        title: Option<String>,
        subject: Option<String>,
        overwrite: bool,
    ) -> ToolResponse {
        let lock = name_lock(name);
        let _guard = lock.lock();
        respond("create presentation", {
            self.store
                .create(name, title, subject, overwrite)
                .map(|_| format!(
                    "Created presentation state: {}",
                    self.store.state_file_path(name).display()
                ))
        })
    }

    pub fn add_slide(&self, name: &str, slide: Slide) -> ToolResponse {
        respond("add slide", self.add_slide_inner(name, slide))
    }

    fn add_slide_inner(&self, name: &str, slide: Slide) -> Result<String> {
        validate_slide(&slide)?;
        let lock = name_lock(name);
        let _guard = lock.lock();
        let doc = self.store.load(name)?;
        let doc = append_slide(doc, slide);
        let count = doc.slides.len();
        self.store.save(&doc)?;
        Ok(format!("Added slide {} to presentation: {}", count, name))
    }

    pub fn replace_slide(&self, name: &str, slide_index: usize, slide: Slide) -> ToolResponse {
        respond(
            "replace slide",
            self.replace_slide_inner(name, slide_index, slide),
        )
    }

    fn replace_slide_inner(&self, name: &str, slide_index: usize, slide: Slide) -> Result<String> {
        validate_slide(&slide)?;
        let lock = name_lock(name);
        let _guard = lock.lock();
        let doc = self.store.load(name)?;
        let doc = replace_slide_at(doc, slide_index, slide)?;
        self.store.save(&doc)?;
        Ok(format!(
            "Replaced slide {} in presentation: {}",
            slide_index, name
        ))
    }

    pub fn remove_slide(&self, name: &str, slide_index: usize) -> ToolResponse {
        respond("remove slide", self.remove_slide_inner(name, slide_index))
    }

    fn remove_slide_inner(&self, name: &str, slide_index: usize) -> Result<String> {
        let lock = name_lock(name);
        let _guard = lock.lock();
        let doc = self.store.load(name)?;
        let doc = remove_slide_at(doc, slide_index)?;
        self.store.save(&doc)?;
        Ok(format!(
            "Removed slide {} from presentation: {}",
            slide_index, name
        ))
    }

    pub fn get_slide(&self, name: &str, slide_index: usize) -> ToolResponse {
        respond("get slide", {
            self.store.load(name).and_then(|doc| {
                check_index(&doc, slide_index)?;
                Ok(serde_json::to_string_pretty(&doc.slides[slide_index])?)
            })
        })
    }

    pub fn get_slides(&self, name: &str) -> ToolResponse {
        respond("get slides", {
            self.store
                .load(name)
                .and_then(|doc| Ok(serde_json::to_string_pretty(&doc.slides)?))
        })
    }

    pub fn export_presentation_as_pptx(&self, name: &str, out_dir: &Path) -> ToolResponse {
        let lock = name_lock(name);
        let _guard = lock.lock();
        respond("export presentation", {
            export_pptx(&self.store, name, out_dir)
                .map(|path| format!("Generated PPTX file: {}", path.display()))
        })
    }

    pub fn export_slide_as_png(
        &self,
        name: &str,
        slide_index: usize,
        out_dir: &Path,
    ) -> ToolResponse {
        let lock = name_lock(name);
        let _guard = lock.lock();
        respond("export slide", {
            export_slide_png(&self.store, &self.converter, name, slide_index, out_dir)
                .map(|path| format!("Generated PNG file: {}", path.display()))
        })
    }

    pub fn export_slides_as_png(&self, name: &str, out_dir: &Path) -> ToolResponse {
        let lock = name_lock(name);
        let _guard = lock.lock();
        respond("export slides", {
            export_slides_png(&self.store, &self.converter, name, out_dir).map(|paths| {
                format!(
                    "Generated {} PNG file(s):\n{}",
                    paths.len(),
                    paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<String>>()
                        .join("\n")
                )
            })
        })
    }
}
