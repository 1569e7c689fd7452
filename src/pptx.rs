// ABOUTME: PPTX serialization module for the deckforge application
// ABOUTME: Writes an assembled deck graph as an OOXML package

use crate::assemble::{
    BulletSpec, DeckGraph, FillSpec, Frame, PageNumber, Shape, SlideGraph, TextBox, SLIDE_CX,
    SLIDE_CY,
};
use crate::errors::Result;
use crate::schema::{Align, VAlign};
use chrono;
use log::info;
use quick_xml::escape::escape;
use std::fs;
use std::io::Write;
use std::path::Path;
use zip::{write::FileOptions, ZipWriter};

const EMU_PER_POINT: f64 = 12_700.0;

// Fixed field GUID for the slide-number placeholder, required by the fld element.
const SLIDE_NUM_FIELD_GUID: &str = "{2C2D5B1C-6AB5-43F5-9D4D-1C1B45FE6F3A}";

/// Serialize a deck graph to a PPTX file at `output_file`.
pub fn write_pptx(graph: &DeckGraph, output_file: &Path) -> Result<()> {
    info!("Writing PPTX with {} slide(s) to {:?}", graph.slides.len(), output_file);

    if let Some(parent) = output_file.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = fs::File::create(output_file)?;
    let mut zip = ZipWriter::new(file);
    let slide_count = graph.slides.len();

    zip.start_file("[Content_Types].xml", FileOptions::default())?;
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    {slides}
</Types>"#,
        slides = (0..slide_count)
            .map(|i| format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i + 1
            ))
            .collect::<Vec<String>>()
            .join("\n    ")
    );
    zip.write_all(content_types.as_bytes())?;

    zip.start_file("_rels/.rels", FileOptions::default())?;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    zip.write_all(rels.as_bytes())?;

    zip.start_file("docProps/app.xml", FileOptions::default())?;
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>deckforge</Application>
    <Slides>{}</Slides>
</Properties>"#,
        slide_count
    );
    zip.write_all(app_xml.as_bytes())?;

    zip.start_file("docProps/core.xml", FileOptions::default())?;
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{title}</dc:title>
    <dc:subject>{subject}</dc:subject>
    <dc:creator>deckforge</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        title = escape(graph.title.as_deref().unwrap_or("")),
        subject = escape(graph.subject.as_deref().unwrap_or("")),
        created = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    );
    zip.write_all(core_xml.as_bytes())?;

    zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())?;
    let mut pres_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in 0..slide_count {
        pres_rels.push_str(&format!(
            r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i + 1,
            i + 1
        ));
        pres_rels.push('\n');
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    zip.start_file("ppt/presentation.xml", FileOptions::default())?;
    let presentation_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        slide_ids = (0..slide_count)
            .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect::<Vec<String>>()
            .join("\n"),
        cx = SLIDE_CX,
        cy = SLIDE_CY
    );
    zip.write_all(presentation_xml.as_bytes())?;

    for (i, slide) in graph.slides.iter().enumerate() {
        let slide_num = i + 1;
        let mut rels = SlideRels::default();
        let slide_xml = slide_to_xml(slide, &mut rels);

        zip.start_file(
            format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
            FileOptions::default(),
        )?;
        zip.write_all(rels.to_xml().as_bytes())?;

        zip.start_file(
            format!("ppt/slides/slide{}.xml", slide_num),
            FileOptions::default(),
        )?;
        zip.write_all(slide_xml.as_bytes())?;
    }

    zip.finish()?;
    info!("PPTX file created at {:?}", output_file);
    Ok(())
}

/// Relationship table for one slide part; hyperlinks are registered while
/// the slide XML is generated.
#[derive(Default)]
struct SlideRels {
    entries: Vec<String>,
}

impl SlideRels {
    fn next_id(&self) -> String {
        format!("rId{}", self.entries.len() + 1)
    }

    fn add_external(&mut self, url: &str) -> String {
        let id = self.next_id();
        self.entries.push(format!(
            r#"    <Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="{}" TargetMode="External"/>"#,
            id,
            escape(url)
        ));
        id
    }

    fn add_slide_target(&mut self, slide_index: usize) -> String {
        let id = self.next_id();
        self.entries.push(format!(
            r#"    <Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slide{}.xml"/>"#,
            id,
            slide_index + 1
        ));
        id
    }

    fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
{}</Relationships>"#,
            self.entries
                .iter()
                .map(|e| format!("{}\n", e))
                .collect::<String>()
        )
    }
}

fn slide_to_xml(slide: &SlideGraph, rels: &mut SlideRels) -> String {
    let background = slide
        .background
        .as_ref()
        .map(background_xml)
        .unwrap_or_default();

    let mut shapes = String::new();
    for (idx, shape) in slide.shapes.iter().enumerate() {
        // id 1 is the group shape; content shapes start at 2
        let shape_id = idx + 2;
        let xml = match shape {
            Shape::TextBox(text_box) => text_box_xml(text_box, shape_id, rels),
            Shape::PageNumber(page_number) => page_number_xml(page_number, shape_id),
        };
        shapes.push_str(&xml);
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
{background}        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
{shapes}        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:sld>"#
    )
}

fn background_xml(fill: &FillSpec) -> String {
    format!(
        r#"        <p:bg>
            <p:bgPr>
                <a:solidFill>{}</a:solidFill>
                <a:effectLst/>
            </p:bgPr>
        </p:bg>
"#,
        srgb_clr(&fill.color, fill.opacity_pct)
    )
}

/// `<a:srgbClr>` with an optional alpha child when not fully opaque.
fn srgb_clr(color: &str, opacity_pct: f64) -> String {
    if (opacity_pct - 100.0).abs() < f64::EPSILON {
        format!(r#"<a:srgbClr val="{}"/>"#, escape(color))
    } else {
        // alpha is in thousandths of a percent
        format!(
            r#"<a:srgbClr val="{}"><a:alpha val="{}"/></a:srgbClr>"#,
            escape(color),
            (opacity_pct * 1000.0).round() as i64
        )
    }
}

fn xfrm_xml(frame: &Frame) -> String {
    format!(
        r#"                    <a:xfrm>
                        <a:off x="{}" y="{}"/>
                        <a:ext cx="{}" cy="{}"/>
                    </a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn body_pr_xml(valign: Option<VAlign>) -> String {
    let anchor = match valign {
        Some(VAlign::Top) => r#" anchor="t""#,
        Some(VAlign::Middle) => r#" anchor="ctr""#,
        Some(VAlign::Bottom) => r#" anchor="b""#,
        None => "",
    };
    format!(r#"<a:bodyPr wrap="square"{}/>"#, anchor)
}

fn text_box_xml(text_box: &TextBox, shape_id: usize, rels: &mut SlideRels) -> String {
    let fill = text_box
        .fill
        .as_ref()
        .map(|f| {
            format!(
                "\n                    <a:solidFill>{}</a:solidFill>",
                srgb_clr(&f.color, f.opacity_pct)
            )
        })
        .unwrap_or_default();

    let mut paragraph_pr = String::new();
    {
        let algn = match text_box.paragraph.align {
            Some(Align::Left) => r#" algn="l""#.to_string(),
            Some(Align::Center) => r#" algn="ctr""#.to_string(),
            Some(Align::Right) => r#" algn="r""#.to_string(),
            None => String::new(),
        };
        let (indent_attrs, bullet_children) = match &text_box.paragraph.bullet {
            Some(spec) => bullet_xml(spec),
            None => (String::new(), String::new()),
        };
        if !algn.is_empty() || !indent_attrs.is_empty() || !bullet_children.is_empty() {
            paragraph_pr = format!(
                "\n                        <a:pPr{}{}>{}</a:pPr>",
                algn, indent_attrs, bullet_children
            );
        }
    }

    let runs: String = text_box
        .runs
        .iter()
        .map(|run| run_xml(run, rels))
        .collect();

    format!(
        r#"            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="{shape_id}" name="TextBox {shape_id}"/>
                    <p:cNvSpPr txBox="1"/>
                    <p:nvPr/>
                </p:nvSpPr>
                <p:spPr>
{xfrm}
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>{fill}
                </p:spPr>
                <p:txBody>
                    {body_pr}
                    <a:lstStyle/>
                    <a:p>{paragraph_pr}{runs}
                    </a:p>
                </p:txBody>
            </p:sp>
"#,
        shape_id = shape_id,
        xfrm = xfrm_xml(&text_box.frame),
        fill = fill,
        body_pr = body_pr_xml(text_box.valign),
        paragraph_pr = paragraph_pr,
        runs = runs
    )
}

/// Returns (pPr attributes, pPr children) for a bullet spec.
fn bullet_xml(spec: &BulletSpec) -> (String, String) {
    match spec {
        BulletSpec::None => (String::new(), "<a:buNone/>".to_string()),
        BulletSpec::Char { ch, indent_pts } => (
            indent_attrs(*indent_pts),
            format!(r#"<a:buChar char="{}"/>"#, escape(ch)),
        ),
        BulletSpec::AutoNum { scheme, indent_pts } => (
            indent_attrs(*indent_pts),
            format!(r#"<a:buAutoNum type="{}"/>"#, scheme),
        ),
    }
}

fn indent_attrs(indent_pts: Option<f64>) -> String {
    match indent_pts {
        Some(pts) => {
            let emu = (pts * EMU_PER_POINT).round() as i64;
            format!(r#" marL="{}" indent="-{}""#, emu, emu)
        }
        None => String::new(),
    }
}

fn run_props_xml(
    size_hundredths: Option<u32>,
    bold: bool,
    italic: bool,
    underline_style: Option<&str>,
    children: &str,
) -> String {
    let mut attrs = String::from(r#" lang="en-US""#);
    if let Some(sz) = size_hundredths {
        attrs.push_str(&format!(r#" sz="{}""#, sz));
    }
    if bold {
        attrs.push_str(r#" b="1""#);
    }
    if italic {
        attrs.push_str(r#" i="1""#);
    }
    if let Some(style) = underline_style {
        attrs.push_str(&format!(r#" u="{}""#, style));
    }
    attrs.push_str(r#" dirty="0""#);

    if children.is_empty() {
        format!("<a:rPr{}/>", attrs)
    } else {
        format!("<a:rPr{}>{}</a:rPr>", attrs, children)
    }
}

fn run_xml(run: &crate::assemble::RunProps, rels: &mut SlideRels) -> String {
    let mut children = String::new();

    if let Some(color) = &run.color {
        children.push_str(&format!("<a:solidFill>{}</a:solidFill>", srgb_clr(color, 100.0)));
    }
    if let Some(color) = &run.underline_color {
        children.push_str(&format!(
            "<a:uFill><a:solidFill>{}</a:solidFill></a:uFill>",
            srgb_clr(color, 100.0)
        ));
    }
    if let Some(face) = &run.font_face {
        children.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(face)));
    }
    if let Some(link) = &run.hyperlink {
        let (r_id, action) = match link.slide {
            // In-deck jump: the relationship targets the slide part and the
            // click action selects the jump behavior.
            Some(target) => (
                rels.add_slide_target(target),
                r#" action="ppaction://hlinksldjump""#,
            ),
            None => (rels.add_external(&link.url), ""),
        };
        let tooltip = link
            .tooltip
            .as_deref()
            .map(|t| format!(r#" tooltip="{}""#, escape(t)))
            .unwrap_or_default();
        children.push_str(&format!(
            r#"<a:hlinkClick r:id="{}"{}{}/>"#,
            r_id, action, tooltip
        ));
    }

    format!(
        "\n                        <a:r>{}<a:t>{}</a:t></a:r>",
        run_props_xml(
            run.size_hundredths,
            run.bold,
            run.italic,
            run.underline_style,
            &children
        ),
        escape(&run.text)
    )
}

fn page_number_xml(page_number: &PageNumber, shape_id: usize) -> String {
    let mut children = String::new();
    if let Some(color) = &page_number.color {
        children.push_str(&format!("<a:solidFill>{}</a:solidFill>", srgb_clr(color, 100.0)));
    }
    if let Some(face) = &page_number.font_face {
        children.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(face)));
    }

    format!(
        r#"            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="{shape_id}" name="Slide Number {shape_id}"/>
                    <p:cNvSpPr txBox="1"/>
                    <p:nvPr/>
                </p:nvSpPr>
                <p:spPr>
{xfrm}
                    <a:prstGeom prst="rect">
                        <a:avLst/>
                    </a:prstGeom>
                </p:spPr>
                <p:txBody>
                    <a:bodyPr wrap="square"/>
                    <a:lstStyle/>
                    <a:p>
                        <a:fld id="{guid}" type="slidenum">{rpr}<a:t>1</a:t></a:fld>
                    </a:p>
                </p:txBody>
            </p:sp>
"#,
        shape_id = shape_id,
        xfrm = xfrm_xml(&page_number.frame),
        guid = SLIDE_NUM_FIELD_GUID,
        rpr = run_props_xml(page_number.size_hundredths, false, false, None, &children)
    )
}
