//! PDF renderer – takes a [`DocumentPlan`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::io::Write;

use printpdf::*;
use sha2::{Digest, Sha256};

use crate::error::{RenderError, Result};
use crate::layout_config::*;
use crate::style::Color as PlanColor;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Length of each of the two trailer `/ID` strings printpdf writes.
const ID_LEN: usize = 32;

/// Render a plan into PDF bytes.
///
/// Images the PDF writer cannot register are skipped with a `log::warn`,
/// like any other logo failure. The same plan always yields the same bytes.
pub fn render_pdf(plan: &DocumentPlan) -> Result<Vec<u8>> {
    if plan.page_width_pt <= 0.0 || plan.page_height_pt <= 0.0 {
        return Err(RenderError::RenderFailure(format!(
            "invalid page size {}×{}",
            plan.page_width_pt, plan.page_height_pt
        )));
    }
    let page_w = Mm(plan.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(plan.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&plan.title);

    // ── Register images ───────────────────────────────────────────────────
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();
    let resources: Vec<Option<ImageResource>> = plan
        .images
        .iter()
        .map(|img| match RawImage::decode_from_bytes(&img.bytes, &mut img_warnings) {
            Ok(raw) => Some(ImageResource {
                xobj_id: doc.add_image(&raw),
                px_width: img.px_width,
                px_height: img.px_height,
            }),
            Err(e) => {
                log::warn!("Skipping logo: PDF encode error: {e}");
                None
            }
        })
        .collect();

    // ── Render pages ──────────────────────────────────────────────────────
    let mut pages = Vec::with_capacity(plan.pages.len().max(1));
    for page in &plan.pages {
        let mut ops = Vec::with_capacity(page.ops.len() * 6);
        for op in &page.ops {
            render_op(&mut ops, op, &resources)?;
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let mut bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    if !bytes.starts_with(b"%PDF-") {
        return Err(RenderError::RenderFailure(
            "PDF writer produced no document".to_string(),
        ));
    }
    stamp_document_id(&mut bytes, plan)?;
    Ok(bytes)
}

/// Overwrite the random trailer `/ID` pair with the sha256 of the plan.
///
/// Both strings keep their length, so xref offsets stay valid.
fn stamp_document_id(bytes: &mut [u8], plan: &DocumentPlan) -> Result<()> {
    let digest = Sha256::digest(plan.to_json().as_bytes());
    let hex: Vec<u8> = digest
        .iter()
        .flat_map(|b| format!("{b:02X}").into_bytes())
        .collect();

    let mut pos = find_id_array(bytes)
        .ok_or_else(|| RenderError::RenderFailure("PDF trailer has no /ID".to_string()))?;
    for id in hex.chunks(ID_LEN) {
        let open = bytes[pos..]
            .iter()
            .position(|&b| b == b'(')
            .map(|i| pos + i + 1)
            .ok_or_else(|| RenderError::RenderFailure("truncated /ID array".to_string()))?;
        let close = open + ID_LEN;
        if bytes.get(close) != Some(&b')') {
            return Err(RenderError::RenderFailure(
                "unexpected /ID string length".to_string(),
            ));
        }
        bytes[open..close].copy_from_slice(id);
        pos = close + 1;
    }
    Ok(())
}

/// Offset just past the last `/ID` key that opens an array.
fn find_id_array(bytes: &[u8]) -> Option<usize> {
    (0..bytes.len().saturating_sub(3)).rev().find_map(|i| {
        if &bytes[i..i + 3] != b"/ID" {
            return None;
        }
        let next = bytes[i + 3..].iter().find(|b| !b.is_ascii_whitespace());
        (next == Some(&b'[')).then_some(i + 3)
    })
}

/// Render `plan` and copy the finished document into `out`.
///
/// The whole document is serialised into a private buffer first, so on any
/// error nothing has been written to `out`.
pub fn write_pdf<W: Write>(plan: &DocumentPlan, out: &mut W) -> Result<usize> {
    let bytes = render_pdf(plan)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(bytes.len())
}

fn rgb(c: &PlanColor) -> printpdf::Color {
    printpdf::Color::Rgb(Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

fn render_op(ops: &mut Vec<Op>, op: &DrawOp, images: &[Option<ImageResource>]) -> Result<()> {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            font_size,
            bold,
            color,
        } => {
            let font = if *bold {
                BuiltinFont::HelveticaBold
            } else {
                BuiltinFont::Helvetica
            };
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point { x: Pt(*x), y: Pt(*y) },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(*font_size),
                font,
            });
            ops.push(Op::SetFillColor { col: rgb(color) });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(to_winlatin(text))],
                font,
            });
            ops.push(Op::EndTextSection);
        }
        DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        } => {
            ops.push(Op::SetOutlineColor { col: rgb(color) });
            ops.push(Op::SetOutlineThickness { pt: Pt(*width) });
            ops.push(Op::DrawLine {
                line: Line {
                    points: vec![point(*x1, *y1), point(*x2, *y2)],
                    is_closed: false,
                },
            });
        }
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        } => {
            let (x1, y1, x2, y2) = (*x, *y, x + width, y + height);
            ops.push(Op::SetFillColor { col: rgb(fill) });
            ops.push(Op::DrawPolygon {
                polygon: Polygon {
                    rings: vec![PolygonRing {
                        points: vec![point(x1, y1), point(x2, y1), point(x2, y2), point(x1, y2)],
                    }],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                },
            });
        }
        DrawOp::Image {
            image,
            x,
            y,
            width,
            height,
        } => {
            let slot = images.get(*image).ok_or_else(|| {
                RenderError::RenderFailure(format!("draw op references missing image {image}"))
            })?;
            // Registration failures were already logged; draw nothing.
            let Some(res) = slot else {
                return Ok(());
            };

            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(*x)),
                    translate_y: Some(Pt(*y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_plan() -> DocumentPlan {
        DocumentPlan {
            title: "empty".into(),
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            images: Vec::new(),
            pages: Vec::new(),
        }
    }

    #[test]
    fn render_empty_page() {
        let bytes = render_pdf(&empty_plan()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn write_pdf_copies_into_caller_buffer() {
        let mut out = Vec::new();
        let n = write_pdf(&empty_plan(), &mut out).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(&out[0..5], b"%PDF-");
    }

    #[test]
    fn failed_render_writes_nothing() {
        let mut plan = empty_plan();
        plan.pages.push(PagePlan {
            page_index: 0,
            ops: vec![DrawOp::Image {
                image: 3,
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            }],
        });
        let mut out = Vec::new();
        assert!(write_pdf(&plan, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn same_plan_gives_identical_bytes() {
        let a = render_pdf(&empty_plan()).unwrap();
        let b = render_pdf(&empty_plan()).unwrap();
        assert_eq!(a, b);

        let mut other = empty_plan();
        other.title = "other".into();
        assert_ne!(render_pdf(&other).unwrap(), a);
    }

    #[test]
    fn document_id_is_replaced_in_place() {
        let mut bytes = b"trailer<</Root 1 0 R/ID[(ABCDEFGHIJABCDEFGHIJABCDEFGHIJAB)(JJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJ)]>>".to_vec();
        let len = bytes.len();
        stamp_document_id(&mut bytes, &empty_plan()).unwrap();
        assert_eq!(bytes.len(), len);
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("ABCDEFGHIJ"));
        assert!(!text.contains("JJJJ"));
        assert!(text.ends_with(")]>>"));

        let mut broken = b"trailer<</ID[(SHORT)(SHORT)]>>".to_vec();
        assert!(stamp_document_id(&mut broken, &empty_plan()).is_err());
    }

    #[test]
    fn winlatin_maps_ellipsis_and_euro() {
        assert_eq!(to_winlatin("€…").as_bytes(), &[0x80u8, 0x85][..]);
        assert_eq!(to_winlatin("KES 1.00").as_bytes(), b"KES 1.00");
    }
}
