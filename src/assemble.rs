// ABOUTME: Document assembler turning a validated presentation into a shape graph
// ABOUTME: Pure, total mapping; the pptx module serializes the result

use crate::schema::{
    Align, Bullet, Hyperlink, PresentationDocument, Slide, TextBlock, VAlign,
};

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Slide canvas, 10" x 5.625" (16:9).
pub const SLIDE_CX: i64 = 9_144_000;
pub const SLIDE_CY: i64 = 5_143_500;

const DEFAULT_TEXT_FRAME: (f64, f64, f64, f64) = (0.5, 0.5, 9.0, 1.0);
const DEFAULT_PAGE_NUM_SIZE: (f64, f64) = (1.0, 0.4);

/// Serializable vocabulary for one deck: what the OOXML writer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckGraph {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub slides: Vec<SlideGraph>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlideGraph {
    pub background: Option<FillSpec>,
    pub shapes: Vec<Shape>,
}

/// A solid fill with opacity in percent (100 = opaque).
#[derive(Debug, Clone, PartialEq)]
pub struct FillSpec {
    pub color: String,
    pub opacity_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    TextBox(TextBox),
    PageNumber(PageNumber),
}

/// A rectangle in EMU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    pub frame: Frame,
    pub fill: Option<FillSpec>,
    pub valign: Option<VAlign>,
    pub paragraph: ParagraphProps,
    pub runs: Vec<RunProps>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphProps {
    pub align: Option<Align>,
    pub bullet: Option<BulletSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BulletSpec {
    /// Explicitly no bullet.
    None,
    /// Literal bullet character.
    Char { ch: String, indent_pts: Option<f64> },
    /// Automatic numbering with an OOXML scheme token.
    AutoNum {
        scheme: &'static str,
        indent_pts: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunProps {
    pub text: String,
    pub color: Option<String>,
    pub font_face: Option<String>,
    /// Font size in hundredths of a point, the DrawingML `sz` unit.
    pub size_hundredths: Option<u32>,
    pub bold: bool,
    pub italic: bool,
    pub underline_style: Option<&'static str>,
    pub underline_color: Option<String>,
    pub hyperlink: Option<Hyperlink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageNumber {
    pub frame: Frame,
    pub color: Option<String>,
    pub font_face: Option<String>,
    pub size_hundredths: Option<u32>,
}

pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

pub fn points_to_hundredths(points: f64) -> u32 {
    (points * 100.0).round() as u32
}

/// Strip a leading `#` and uppercase, so "ff0000" and "#FF0000" both become
/// the "FF0000" DrawingML expects.
pub fn normalize_color(color: &str) -> String {
    color.trim_start_matches('#').to_uppercase()
}

/// Convert a validated presentation into the writer's vocabulary. Slide
/// order is preserved; this mapping never fails for input that passed
/// validation.
pub fn assemble(doc: &PresentationDocument) -> DeckGraph {
    DeckGraph {
        title: doc.metadata.title.clone(),
        subject: doc.metadata.subject.clone(),
        slides: doc
            .slides
            .iter()
            .map(|slide| assemble_slide(slide, doc.slides.len()))
            .collect(),
    }
}

fn assemble_slide(slide: &Slide, slide_count: usize) -> SlideGraph {
    let mut graph = SlideGraph::default();

    if let Some(background) = &slide.background {
        if let Some(color) = &background.color {
            graph.background = Some(FillSpec {
                color: normalize_color(color),
                opacity_pct: 100.0 - background.transparency.unwrap_or(0.0),
            });
        }
    }

    for block in slide.texts.as_deref().unwrap_or_default() {
        graph
            .shapes
            .push(Shape::TextBox(assemble_text_box(
                block,
                slide.color.as_deref(),
                slide_count,
            )));
    }

    if let Some(sn) = &slide.slide_number {
        graph.shapes.push(Shape::PageNumber(PageNumber {
            frame: Frame {
                x: inches_to_emu(sn.x),
                y: inches_to_emu(sn.y),
                cx: inches_to_emu(DEFAULT_PAGE_NUM_SIZE.0),
                cy: inches_to_emu(DEFAULT_PAGE_NUM_SIZE.1),
            },
            color: sn.color.as_deref().map(normalize_color),
            font_face: sn.font_face.clone(),
            size_hundredths: sn.font_size.map(points_to_hundredths),
        }));
    }

    graph
}

/// A block becomes one text box: a single run stands alone, a group shares
/// one paragraph. Box-level settings (frame, fill, alignment, bullet) are
/// taken from the first run that specifies them; typography stays per run.
fn assemble_text_box(block: &TextBlock, slide_color: Option<&str>, slide_count: usize) -> TextBox {
    let runs = block.runs();

    let mut x = None;
    let mut y = None;
    let mut w = None;
    let mut h = None;
    let mut fill = None;
    let mut align = None;
    let mut valign = None;
    let mut bullet = None;

    for run in runs {
        let Some(options) = &run.options else { continue };
        x = x.or(options.x);
        y = y.or(options.y);
        w = w.or(options.w);
        h = h.or(options.h);
        fill = fill.or_else(|| options.fill.as_deref().map(normalize_color));
        align = align.or(options.align);
        valign = valign.or(options.valign);
        bullet = bullet.or_else(|| options.bullet.as_ref().map(bullet_spec));
    }

    TextBox {
        frame: Frame {
            x: inches_to_emu(x.unwrap_or(DEFAULT_TEXT_FRAME.0)),
            y: inches_to_emu(y.unwrap_or(DEFAULT_TEXT_FRAME.1)),
            cx: inches_to_emu(w.unwrap_or(DEFAULT_TEXT_FRAME.2)),
            cy: inches_to_emu(h.unwrap_or(DEFAULT_TEXT_FRAME.3)),
        },
        fill: fill.map(|color| FillSpec {
            color,
            opacity_pct: 100.0,
        }),
        valign,
        paragraph: ParagraphProps { align, bullet },
        runs: runs
            .iter()
            .map(|run| assemble_run(run, slide_color, slide_count))
            .collect(),
    }
}

fn assemble_run(
    run: &crate::schema::TextRun,
    slide_color: Option<&str>,
    slide_count: usize,
) -> RunProps {
    let options = run.options.as_ref();
    let color = options
        .and_then(|o| o.color.as_deref())
        .or(slide_color)
        .map(normalize_color);

    let (underline_style, underline_color) = match options.and_then(|o| o.underline.as_ref()) {
        Some(u) => (
            Some(u.style.map_or("sng", |s| s.as_token())),
            u.color.as_deref().map(normalize_color),
        ),
        None => (None, None),
    };

    RunProps {
        text: run.text.clone(),
        color,
        font_face: options.and_then(|o| o.font_face.clone()),
        size_hundredths: options.and_then(|o| o.font_size).map(points_to_hundredths),
        bold: options.and_then(|o| o.bold).unwrap_or(false),
        italic: options.and_then(|o| o.italic).unwrap_or(false),
        underline_style,
        underline_color,
        hyperlink: options.and_then(|o| o.hyperlink.clone()).and_then(|mut link| {
            // a jump to a slide that does not exist would leave a dangling
            // relationship in the package; fall back to the URL or drop
            if matches!(link.slide, Some(target) if target >= slide_count) {
                link.slide = None;
                if link.url.is_empty() {
                    return None;
                }
            }
            Some(link)
        }),
    }
}

fn bullet_spec(bullet: &Bullet) -> BulletSpec {
    match bullet {
        Bullet::Flag(false) => BulletSpec::None,
        Bullet::Flag(true) => BulletSpec::Char {
            ch: "\u{2022}".to_string(),
            indent_pts: None,
        },
        Bullet::Options(options) => match options.kind {
            crate::schema::BulletKind::Number => BulletSpec::AutoNum {
                scheme: options
                    .number_type
                    .map_or("arabicPeriod", |t| t.as_token()),
                indent_pts: options.indent,
            },
            crate::schema::BulletKind::Bullet => BulletSpec::Char {
                ch: options
                    .character_code
                    .as_deref()
                    .and_then(decode_character_code)
                    .unwrap_or_else(|| "\u{2022}".to_string()),
                indent_pts: options.indent,
            },
        },
    }
}

/// Parse a hex code point such as "25BA" into its character. Invalid codes
/// fall back to the default bullet rather than failing the total mapping.
fn decode_character_code(code: &str) -> Option<String> {
    u32::from_str_radix(code, 16)
        .ok()
        .and_then(char::from_u32)
        .map(|c| c.to_string())
}
