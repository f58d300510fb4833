//! Image annotations carried in assistant replies.
//!
//! Vision models answer detection prompts with a JSON array of
//! `{"box_2d": [y_min, x_min, y_max, x_max], "label": ...}` items on a
//! 0-1000 scale, optionally with a base64 PNG `mask`. When such a reply is
//! committed against an attached image preview, it is turned into overlay
//! geometry expressed in percent of the image size.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    BoundingBoxes,
    Segmentation,
}

/// One labelled rectangle over the image.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub label: String,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub hue: u16,
    /// Base64 PNG mask, segmentation only.
    pub mask: Option<String>,
}

impl Overlay {
    /// `hsl(hue, 100%, 50%)` as RGB.
    pub fn rgb(&self) -> (u8, u8, u8) {
        hsl_to_rgb(self.hue as f64, 1.0, 0.5)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub image: String,
    pub kind: AnnotationKind,
    pub overlays: Vec<Overlay>,
}

/// Build an annotation for `text` over `image`, if the text carries one.
pub fn annotate(text: &str, image: &str) -> Option<Annotation> {
    if !text.contains("box_2d") {
        return None;
    }
    let kind = if text.contains("mask") {
        AnnotationKind::Segmentation
    } else {
        AnnotationKind::BoundingBoxes
    };

    let items = match extract_json(text)? {
        Value::Array(items) => items,
        _ => return None,
    };

    let overlays: Vec<Overlay> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| overlay_for(index, item, kind))
        .collect();
    if overlays.is_empty() {
        return None;
    }

    Some(Annotation {
        image: image.to_string(),
        kind,
        overlays,
    })
}

/// Pull the JSON payload out of surrounding prose: from the first `[` (or
/// `{` when there is none) through the last `]` (or `}`).
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('[').or_else(|| text.find('{'))?;
    let end = text
        .rfind(']')
        .or_else(|| text.rfind('}'))
        .map(|i| i + 1)?;
    if end <= start {
        return None;
    }

    match serde_json::from_str(&text[start..end]) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("annotation payload is not JSON: {}", e);
            None
        }
    }
}

fn overlay_for(index: usize, item: &Value, kind: AnnotationKind) -> Option<Overlay> {
    let label = item.get("label")?.as_str()?.to_string();
    let coords = item.get("box_2d")?.as_array()?;
    if coords.len() != 4 {
        return None;
    }
    let mut b = [0.0f64; 4];
    for (slot, v) in b.iter_mut().zip(coords) {
        *slot = v.as_f64()?;
    }
    let [y_min, x_min, y_max, x_max] = b;

    let mask = match kind {
        AnnotationKind::Segmentation => Some(item.get("mask")?.as_str()?.to_string()),
        AnnotationKind::BoundingBoxes => None,
    };

    Some(Overlay {
        label,
        top: y_min / 10.0,
        left: x_min / 10.0,
        height: (y_max - y_min) / 10.0,
        width: (x_max - x_min) / 10.0,
        hue: ((index * 137) % 360) as u16,
        mask,
    })
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h % 360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_u8(r1), to_u8(g1), to_u8(b1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_boxes_geometry() {
        let text = r#"Found these:
[{"box_2d": [100, 200, 500, 600], "label": "cat"}]
Done."#;
        let annotation = annotate(text, "http://img/cat.png").expect("annotation");
        assert_eq!(annotation.kind, AnnotationKind::BoundingBoxes);
        assert_eq!(annotation.image, "http://img/cat.png");
        let o = &annotation.overlays[0];
        assert_eq!(o.label, "cat");
        assert_eq!((o.top, o.left, o.height, o.width), (10.0, 20.0, 40.0, 40.0));
        assert_eq!(o.hue, 0);
        assert!(o.mask.is_none());
    }

    #[test]
    fn test_hue_uses_original_index() {
        let text = r#"[{"label": "no box"}, {"box_2d": [0, 0, 10, 10], "label": "b"}, {"box_2d": [0, 0, 10, 10], "label": "c"}, {"box_2d": [0, 0, 10, 10], "label": "d"}]"#;
        let annotation = annotate(text, "img").expect("annotation");
        let hues: Vec<u16> = annotation.overlays.iter().map(|o| o.hue).collect();
        assert_eq!(hues, vec![137, 274, 51]);
    }

    #[test]
    fn test_segmentation_requires_mask() {
        let text = r#"[{"box_2d": [0, 0, 1000, 1000], "label": "sky", "mask": "iVBOR"}, {"box_2d": [0, 0, 10, 10], "label": "nomask"}]"#;
        let annotation = annotate(text, "img").expect("annotation");
        assert_eq!(annotation.kind, AnnotationKind::Segmentation);
        assert_eq!(annotation.overlays.len(), 1);
        assert_eq!(annotation.overlays[0].mask.as_deref(), Some("iVBOR"));
        assert_eq!(annotation.overlays[0].width, 100.0);
    }

    #[test]
    fn test_plain_reply_is_not_annotated() {
        assert!(annotate("Just a normal answer [1].", "img").is_none());
    }

    #[test]
    fn test_object_payload_is_rejected() {
        assert!(annotate(r#"{"box_2d": [0, 0, 1, 1], "label": "x"}"#, "img").is_none());
    }

    #[test]
    fn test_extract_json_bad_payload() {
        assert!(extract_json("box_2d [not json]").is_none());
        assert!(extract_json("no brackets").is_none());
    }

    #[test]
    fn test_overlay_rgb() {
        let mut o = Overlay {
            label: "x".into(),
            top: 0.0,
            left: 0.0,
            width: 0.0,
            height: 0.0,
            hue: 0,
            mask: None,
        };
        assert_eq!(o.rgb(), (255, 0, 0));
        o.hue = 120;
        assert_eq!(o.rgb(), (0, 255, 0));
        o.hue = 240;
        assert_eq!(o.rgb(), (0, 0, 255));
    }
}
