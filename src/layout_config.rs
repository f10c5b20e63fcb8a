//! Draw plan – the intermediate representation between layout and PDF
//! rendering. It encodes exactly what goes on each page, in PDF coordinates
//! (origin bottom-left, y grows upwards), so two renders of the same input
//! can be compared without looking at PDF bytes.

use serde::{Deserialize, Serialize};

use crate::style::Color;

/// A complete document ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPlan {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    /// Raster images referenced by [`DrawOp::Image`].
    pub images: Vec<EmbeddedImage>,
    /// Ordered list of pages.
    pub pages: Vec<PagePlan>,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub page_index: usize,
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawOp {
    /// A single line of text; `y` is the baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        font_size: f32,
        bold: bool,
        color: Color,
    },
    /// A straight rule between two points.
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
    /// A filled rectangle; (`x`, `y`) is the bottom-left corner.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Color,
    },
    /// An image from [`DocumentPlan::images`]; (`x`, `y`) is the bottom-left
    /// corner of the placement.
    Image {
        image: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Encoded raster bytes (PNG/JPEG) plus their pixel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

impl DocumentPlan {
    /// Serialise to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }

    /// All text drawn on `page`, in drawing order.
    pub fn page_text(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|p| {
                p.ops
                    .iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn image_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| &p.ops)
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

impl DrawOp {
    /// Lowest y this operation touches.
    pub fn bottom(&self) -> f32 {
        match self {
            DrawOp::Text { y, .. } => *y,
            DrawOp::Line { y1, y2, .. } => y1.min(*y2),
            DrawOp::Rect { y, .. } | DrawOp::Image { y, .. } => *y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip_keeps_ops() {
        let plan = DocumentPlan {
            title: "t".into(),
            page_width_pt: 100.0,
            page_height_pt: 200.0,
            images: Vec::new(),
            pages: vec![PagePlan {
                page_index: 0,
                ops: vec![DrawOp::Text {
                    x: 1.0,
                    y: 2.0,
                    text: "hello".into(),
                    font_size: 9.0,
                    bold: false,
                    color: Color::BLACK,
                }],
            }],
        };
        let parsed = DocumentPlan::from_json(&plan.to_json()).unwrap();
        assert_eq!(parsed, plan);
        assert_eq!(parsed.page_text(0), vec!["hello"]);
        assert!(parsed.page_text(3).is_empty());
    }
}
