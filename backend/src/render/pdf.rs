//! PDF export of slide decks with genpdf.
//!
//! Each slide starts on a new page. Slide lines are rendered as follows:
//! - empty line: vertical break
//! - `- item`: bullet
//! - `[img:ID]`: the template image `ID`, scaled to the printable width
//! - anything else: a paragraph with `***bold italic***`, `**bold**` and
//!   `*italic*` spans

use crate::engine::document::Presentation;
use crate::error::{Error, Result};
use genpdf::elements::{Break, Image as PdfImage, LinearLayout, PageBreak, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::Document;
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::path::Path;
use tempfile::NamedTempFile;

const PAGE_WIDTH_INCH: f64 = 8.5;
const MARGIN_MM: f64 = 10.0;
const IMAGE_DPI: f64 = 150.0;
/// Largest rendered image edge, in CSS pixels.
const MAX_IMAGE_EDGE_PX: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl TextStyle {
    fn style(self) -> Style {
        match self {
            TextStyle::Regular => Style::new(),
            TextStyle::Bold => Style::new().bold(),
            TextStyle::Italic => Style::new().italic(),
            TextStyle::BoldItalic => Style::new().bold().italic(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextSegment {
    text: String,
    style: TextStyle,
}

impl TextSegment {
    fn new(text: &str, style: TextStyle) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }
}

const MARKERS: [(&str, TextStyle); 3] = [
    ("***", TextStyle::BoldItalic),
    ("**", TextStyle::Bold),
    ("*", TextStyle::Italic),
];

/// Split a line into styled spans. Unclosed markers are kept as literal text.
fn parse_styles(line: &str) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut rest = line;

    'scan: while !rest.is_empty() {
        if rest.starts_with('*') {
            for (marker, style) in MARKERS {
                let Some(after) = rest.strip_prefix(marker) else {
                    continue;
                };
                if let Some(end) = after.find(marker).filter(|&end| end > 0) {
                    if !plain.is_empty() {
                        segments.push(TextSegment::new(&plain, TextStyle::Regular));
                        plain.clear();
                    }
                    segments.push(TextSegment::new(&after[..end], style));
                    rest = &after[end + marker.len()..];
                    continue 'scan;
                }
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            plain.push(c);
        }
        rest = chars.as_str();
    }

    if !plain.is_empty() {
        segments.push(TextSegment::new(&plain, TextStyle::Regular));
    }
    segments
}

fn styled_paragraph(prefix: Option<&str>, line: &str) -> Paragraph {
    let mut paragraph = Paragraph::new("");
    if let Some(prefix) = prefix {
        paragraph.push(StyledString::new(prefix, Style::new()));
    }
    for segment in parse_styles(line) {
        paragraph.push(StyledString::new(segment.text, segment.style.style()));
    }
    paragraph
}

/// Image id of an `[img:ID]` line.
fn image_ref(line: &str) -> Option<&str> {
    line.strip_prefix("[img:")?.strip_suffix(']')
}

fn load_font(
    fonts_dir: &Path,
) -> std::result::Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, Box<dyn StdError>> {
    if let Ok(family) = genpdf::fonts::from_files(fonts_dir, "Arial", None) {
        return Ok(family);
    }
    genpdf::fonts::from_files(fonts_dir, "LiberationSans", None).map_err(Into::into)
}

fn configure_document(fonts_dir: &Path, title: &str) -> std::result::Result<Document, Box<dyn StdError>> {
    let mut doc = Document::new(load_font(fonts_dir)?);
    doc.set_title(title);
    doc.set_font_size(11);
    doc.set_line_spacing(1.0f64);

    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(MARGIN_MM as i32);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

/// Target size for an image so it fits the printable width and the
/// on-screen size limit, never upscaling.
fn fitted_size(width: u32, height: u32) -> (u32, u32) {
    let margin_in = MARGIN_MM / 25.4;
    let content_px = (PAGE_WIDTH_INCH - 2.0 * margin_in) * IMAGE_DPI;
    let edge_px = MAX_IMAGE_EDGE_PX * IMAGE_DPI / 96.0;

    let (w, h) = (width as f64, height as f64);
    let scale = (content_px / w)
        .min(edge_px / w)
        .min(edge_px / h)
        .min(1.0);
    if scale >= 1.0 {
        return (width, height);
    }
    (
        (w * scale).max(1.0).round() as u32,
        (h * scale).max(1.0).round() as u32,
    )
}

/// Flatten onto white, write a temporary PNG and wrap it as a PDF element.
/// The temp file must outlive rendering, so it is handed to the caller.
fn embed_image(bytes: &[u8]) -> std::result::Result<(PdfImage, NamedTempFile), Box<dyn StdError>> {
    let img = load_from_memory(bytes)?;
    let (orig_w, orig_h) = img.dimensions();
    let (new_w, new_h) = fitted_size(orig_w, orig_h);
    let resized: DynamicImage = if (new_w, new_h) == (orig_w, orig_h) {
        img
    } else {
        img.resize(new_w, new_h, FilterType::Lanczos3)
    };

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    let mut tmp = NamedTempFile::new()?;
    {
        let mut encoder = PngEncoder::new(tmp.as_file_mut(), w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raw)?;
    }

    let mut element = PdfImage::from_path(tmp.path())?;
    element.set_dpi(IMAGE_DPI);
    Ok((element, tmp))
}

fn push_slide(
    doc: &mut Document,
    text: &str,
    images: &HashMap<String, Vec<u8>>,
    temp_files: &mut Vec<NamedTempFile>,
) -> std::result::Result<(), Box<dyn StdError>> {
    for line in text.lines() {
        if line.is_empty() {
            doc.push(Break::new(1));
        } else if let Some(item) = line.strip_prefix("- ") {
            let mut layout = LinearLayout::vertical();
            layout.push(styled_paragraph(Some("• "), item));
            doc.push(layout);
        } else if let Some(id) = image_ref(line) {
            match images.get(id) {
                Some(bytes) => {
                    let (element, tmp) = embed_image(bytes)?;
                    temp_files.push(tmp);
                    doc.push(element);
                }
                None => doc.push(Paragraph::new(format!("[missing image: {}]", id))),
            }
        } else {
            doc.push(styled_paragraph(None, line));
        }
    }
    Ok(())
}

fn render(
    presentation: &Presentation,
    images: &HashMap<String, Vec<u8>>,
    fonts_dir: &Path,
    title: &str,
) -> std::result::Result<Vec<u8>, Box<dyn StdError>> {
    let mut doc = configure_document(fonts_dir, title)?;
    let mut temp_files = Vec::new();

    for (i, slide) in presentation.slides.iter().enumerate() {
        if i > 0 {
            doc.push(PageBreak::new());
        }
        push_slide(&mut doc, &slide.text, images, &mut temp_files)?;
    }

    let mut out = Vec::new();
    doc.render(&mut out)?;
    Ok(out)
}

/// Render `presentation` to PDF bytes using the font family in `fonts_dir`.
pub fn render_presentation(
    presentation: &Presentation,
    images: &HashMap<String, Vec<u8>>,
    fonts_dir: &Path,
    title: &str,
) -> Result<Vec<u8>> {
    render(presentation, images, fonts_dir, title).map_err(|e| Error::Render(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, style: TextStyle) -> TextSegment {
        TextSegment::new(text, style)
    }

    #[test]
    fn parses_nested_emphasis_markers() {
        assert_eq!(
            parse_styles("a ***b*** **c** *d* e"),
            vec![
                seg("a ", TextStyle::Regular),
                seg("b", TextStyle::BoldItalic),
                seg(" ", TextStyle::Regular),
                seg("c", TextStyle::Bold),
                seg(" ", TextStyle::Regular),
                seg("d", TextStyle::Italic),
                seg(" e", TextStyle::Regular),
            ]
        );
    }

    #[test]
    fn unclosed_markers_stay_literal() {
        assert_eq!(
            parse_styles("5 * 3 = 15"),
            vec![seg("5 * 3 = 15", TextStyle::Regular)]
        );
        assert_eq!(parse_styles("**"), vec![seg("**", TextStyle::Regular)]);
    }

    #[test]
    fn image_lines_are_recognised() {
        assert_eq!(image_ref("[img:logo]"), Some("logo"));
        assert_eq!(image_ref("see [img:logo]"), None);
    }

    #[test]
    fn images_shrink_but_never_grow() {
        assert_eq!(fitted_size(100, 50), (100, 50));
        let (w, h) = fitted_size(2000, 1000);
        assert!(w <= 313 && h <= 157, "{w}x{h}");
        assert!((w as i64 - 2 * h as i64).abs() <= 1, "{w}x{h}");
    }

    #[test]
    fn missing_fonts_surface_as_render_errors() {
        let dir = tempfile::tempdir().unwrap();
        let deck = Presentation::parse("Hello");
        assert!(matches!(
            render_presentation(&deck, &HashMap::new(), dir.path(), "t"),
            Err(Error::Render(_))
        ));
    }
}
