// ABOUTME: Data model for presentations, slides, and rich text content
// ABOUTME: Provides serde types plus constraint validation for untyped input

use crate::errors::{DeckError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 256.0;

/// Metadata block of a persisted presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The complete persisted state of one named slide deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationDocument {
    pub metadata: Metadata,
    pub slides: Vec<Slide>,
}

impl PresentationDocument {
    pub fn new(name: &str, title: Option<String>, subject: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            metadata: Metadata {
                name: name.to_string(),
                title,
                subject,
                created_at: now,
                updated_at: now,
            },
            slides: Vec::new(),
        }
    }
}

/// One page of the deck.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    /// Default text color for runs on this slide that do not set their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_number: Option<SlideNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<TextBlock>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Percent, 0 (opaque) to 100 (fully transparent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
}

/// Position and styling of the on-slide page-number annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideNumber {
    pub x: f64,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

/// Either one formatted run or a group of runs rendered as one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextBlock {
    Run(TextRun),
    Group(Vec<TextRun>),
}

impl TextBlock {
    pub fn runs(&self) -> &[TextRun] {
        match self {
            TextBlock::Run(run) => std::slice::from_ref(run),
            TextBlock::Group(runs) => runs.as_slice(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<TextOptions>,
}

/// Per-run formatting. Positions are in inches, font sizes in points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<Underline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valign: Option<VAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<Bullet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Hyperlink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Underline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<UnderlineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// OOXML underline styles (DrawingML `u` attribute values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnderlineStyle {
    None,
    Sng,
    Dbl,
    Heavy,
    Dotted,
    DottedHeavy,
    Dash,
    DashHeavy,
    DashLong,
    DashLongHeavy,
    DotDash,
    DotDashHeavy,
    DotDotDash,
    DotDotDashHeavy,
    Wavy,
    WavyHeavy,
    WavyDbl,
}

impl UnderlineStyle {
    pub fn as_token(&self) -> &'static str {
        match self {
            UnderlineStyle::None => "none",
            UnderlineStyle::Sng => "sng",
            UnderlineStyle::Dbl => "dbl",
            UnderlineStyle::Heavy => "heavy",
            UnderlineStyle::Dotted => "dotted",
            UnderlineStyle::DottedHeavy => "dottedHeavy",
            UnderlineStyle::Dash => "dash",
            UnderlineStyle::DashHeavy => "dashHeavy",
            UnderlineStyle::DashLong => "dashLong",
            UnderlineStyle::DashLongHeavy => "dashLongHeavy",
            UnderlineStyle::DotDash => "dotDash",
            UnderlineStyle::DotDashHeavy => "dotDashHeavy",
            UnderlineStyle::DotDotDash => "dotDotDash",
            UnderlineStyle::DotDotDashHeavy => "dotDotDashHeavy",
            UnderlineStyle::Wavy => "wavy",
            UnderlineStyle::WavyHeavy => "wavyHeavy",
            UnderlineStyle::WavyDbl => "wavyDbl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Either a plain on/off flag or a fully specified bullet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bullet {
    Flag(bool),
    Options(BulletOptions),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletOptions {
    #[serde(rename = "type")]
    pub kind: BulletKind,
    /// Hex code point for a custom bullet character, e.g. "25BA".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_code: Option<String>,
    /// Indent in points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_type: Option<BulletNumberType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletKind {
    Number,
    Bullet,
}

/// OOXML auto-number schemes (DrawingML `buAutoNum` types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BulletNumberType {
    AlphaLcParenBoth,
    AlphaLcParenR,
    AlphaLcPeriod,
    AlphaUcParenBoth,
    AlphaUcParenR,
    AlphaUcPeriod,
    ArabicParenBoth,
    ArabicParenR,
    ArabicPeriod,
    ArabicPlain,
    RomanLcParenBoth,
    RomanLcParenR,
    RomanLcPeriod,
    RomanUcParenBoth,
    RomanUcParenR,
    RomanUcPeriod,
}

impl BulletNumberType {
    pub fn as_token(&self) -> &'static str {
        match self {
            BulletNumberType::AlphaLcParenBoth => "alphaLcParenBoth",
            BulletNumberType::AlphaLcParenR => "alphaLcParenR",
            BulletNumberType::AlphaLcPeriod => "alphaLcPeriod",
            BulletNumberType::AlphaUcParenBoth => "alphaUcParenBoth",
            BulletNumberType::AlphaUcParenR => "alphaUcParenR",
            BulletNumberType::AlphaUcPeriod => "alphaUcPeriod",
            BulletNumberType::ArabicParenBoth => "arabicParenBoth",
            BulletNumberType::ArabicParenR => "arabicParenR",
            BulletNumberType::ArabicPeriod => "arabicPeriod",
            BulletNumberType::ArabicPlain => "arabicPlain",
            BulletNumberType::RomanLcParenBoth => "romanLcParenBoth",
            BulletNumberType::RomanLcParenR => "romanLcParenR",
            BulletNumberType::RomanLcPeriod => "romanLcPeriod",
            BulletNumberType::RomanUcParenBoth => "romanUcParenBoth",
            BulletNumberType::RomanUcParenR => "romanUcParenR",
            BulletNumberType::RomanUcPeriod => "romanUcPeriod",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperlink {
    pub url: String,
    /// Target slide index within the same deck, zero-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
}

fn check_font_size(size: Option<f64>, what: &str, violations: &mut Vec<String>) {
    if let Some(size) = size {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size) {
            violations.push(format!(
                "{}: fontSize {} outside [{}, {}]",
                what, size, MIN_FONT_SIZE, MAX_FONT_SIZE
            ));
        }
    }
}

/// Collect every constraint violation on a slide. Pure; no side effects.
pub fn slide_violations(slide: &Slide) -> Vec<String> {
    let mut violations = Vec::new();

    if let Some(background) = &slide.background {
        if let Some(transparency) = background.transparency {
            if !(0.0..=100.0).contains(&transparency) {
                violations.push(format!(
                    "background: transparency {} outside [0, 100]",
                    transparency
                ));
            }
        }
    }

    if let Some(slide_number) = &slide.slide_number {
        check_font_size(slide_number.font_size, "slideNumber", &mut violations);
    }

    for (block_idx, block) in slide.texts.as_deref().unwrap_or_default().iter().enumerate() {
        for (run_idx, run) in block.runs().iter().enumerate() {
            let what = format!("texts[{}] run[{}]", block_idx, run_idx);
            if run.text.is_empty() {
                violations.push(format!("{}: text must not be empty", what));
            }
            if let Some(options) = &run.options {
                check_font_size(options.font_size, &what, &mut violations);
                if let Some(Bullet::Options(bullet)) = &options.bullet {
                    if let Some(indent) = bullet.indent {
                        if indent < 0.0 {
                            violations
                                .push(format!("{}: bullet indent {} is negative", what, indent));
                        }
                    }
                }
            }
        }
    }

    violations
}

/// Validate a slide against all constraints, reporting every violation at once.
pub fn validate_slide(slide: &Slide) -> Result<()> {
    let violations = slide_violations(slide);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DeckError::Validation(violations))
    }
}

/// Validate a whole document, including the metadata invariants.
pub fn validate_document(doc: &PresentationDocument) -> Result<()> {
    let mut violations = Vec::new();

    if let Err(reason) = validate_name(&doc.metadata.name) {
        violations.push(reason);
    }
    if doc.metadata.updated_at < doc.metadata.created_at {
        violations.push("metadata: updatedAt precedes createdAt".to_string());
    }

    for (idx, slide) in doc.slides.iter().enumerate() {
        for violation in slide_violations(slide) {
            violations.push(format!("slides[{}]: {}", idx, violation));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(DeckError::Validation(violations))
    }
}

/// The name doubles as a filename stem, so reject anything that could
/// escape the state directory.
pub fn validate_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("metadata: name must not be empty".to_string());
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(format!("metadata: name {:?} contains path components", name));
    }
    Ok(())
}
