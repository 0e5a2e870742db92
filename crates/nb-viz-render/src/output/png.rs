use crate::RenderError;
use crate::font::FontHandle;

/// Rasterize an SVG document to PNG bytes, `scale` pixels per point.
pub fn svg_to_png(svg: &str, fonts: &FontHandle, scale: f64) -> crate::Result<Vec<u8>> {
    let opt = usvg::Options { fontdb: fonts.database(), ..usvg::Options::default() };

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|e| RenderError::Png(e.to_string()))?;

    let scale = scale as f32;
    let size = tree.size();
    let w = (size.width() * scale).round() as u32;
    let h = (size.height() * scale).round() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| RenderError::Png(format!("failed to create {w}x{h} pixmap")))?;

    // Fill white background
    pixmap.fill(tiny_skia::Color::WHITE);

    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn ihdr_size(png: &[u8]) -> (u32, u32) {
        let w = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let h = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (w, h)
    }

    #[test]
    fn scales_points_to_pixels() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="460.8" height="345.6" viewBox="0 0 460.8 345.6"><rect x="10" y="10" width="50" height="50" fill="red"/></svg>"#;
        let png = svg_to_png(svg, &FontHandle::empty(), 100.0 / 72.0).unwrap();
        assert_eq!(&png[..8], PNG_MAGIC);
        assert_eq!(ihdr_size(&png), (640, 480));
    }

    #[test]
    fn malformed_svg_is_png_error() {
        let err = svg_to_png("<svg", &FontHandle::empty(), 1.0).unwrap_err();
        assert!(matches!(err, RenderError::Png(_)));
    }
}
