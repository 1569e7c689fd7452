// ABOUTME: Pure mutation operations over an in-memory presentation document
// ABOUTME: Every function returns a new value with updatedAt refreshed

use crate::errors::{DeckError, Result};
use crate::schema::{PresentationDocument, Slide};
use chrono::Utc;

/// Refresh the modification timestamp.
pub fn touch(mut doc: PresentationDocument) -> PresentationDocument {
    doc.metadata.updated_at = Utc::now();
    doc
}

/// Insert a slide at the end. The new slide's index is the prior length.
pub fn append_slide(mut doc: PresentationDocument, slide: Slide) -> PresentationDocument {
    doc.slides.push(slide);
    touch(doc)
}

/// Replace the slide at `index`, which must be within `[0, len)`.
pub fn replace_slide_at(
    mut doc: PresentationDocument,
    index: usize,
    slide: Slide,
) -> Result<PresentationDocument> {
    check_index(&doc, index)?;
    doc.slides[index] = slide;
    Ok(touch(doc))
}

/// Remove the slide at `index`; later slides shift down by one.
pub fn remove_slide_at(mut doc: PresentationDocument, index: usize) -> Result<PresentationDocument> {
    check_index(&doc, index)?;
    doc.slides.remove(index);
    Ok(touch(doc))
}

/// Bound check shared by all by-index operations.
pub fn check_index(doc: &PresentationDocument, index: usize) -> Result<()> {
    let len = doc.slides.len();
    if index >= len {
        return Err(DeckError::IndexOutOfRange { index, len });
    }
    Ok(())
}
