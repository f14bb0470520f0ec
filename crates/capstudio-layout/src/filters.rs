//! FFmpeg filter graph construction for caption burn-in.
//!
//! The graph pads a solid-color band onto the chosen side of the frame,
//! then draws the wrapped caption text into it. The band never overlaps
//! the original picture.

use capstudio_models::{CaptionPosition, CaptionSpec};

use crate::layout::{CaptionLayout, LINE_SPACING_PX};

/// Build the pad filter for the caption band.
///
/// `top` shifts the original picture down by the band height; `bottom`
/// keeps it anchored at the top and extends the frame below.
pub fn build_band_pad(spec: &CaptionSpec) -> String {
    let band = spec.band_height_px;
    let y = match spec.position {
        CaptionPosition::Top => band,
        CaptionPosition::Bottom => 0,
    };
    format!(
        "pad=iw:ih+{band}:0:{y}:color={color}",
        color = spec.band_color
    )
}

/// Build the drawtext filter for the wrapped caption.
///
/// The text is read from a side file in the engine's filesystem so no
/// shell-style escaping of user text is needed in the filter string.
pub fn build_drawtext(
    spec: &CaptionSpec,
    layout: &CaptionLayout,
    font_file: &str,
    text_file: &str,
) -> String {
    format!(
        "drawtext=textfile={text_file}:fontfile={font_file}:\
         fontsize={size}:fontcolor={color}:line_spacing={spacing}:\
         x=(w-text_w)/2:y={y}",
        size = spec.font_size_px,
        color = spec.font_color,
        spacing = LINE_SPACING_PX,
        y = layout.draw_y.to_expr(),
    )
}

/// Build the full caption filter graph: pad then drawtext.
pub fn build_caption_filter(
    spec: &CaptionSpec,
    layout: &CaptionLayout,
    font_file: &str,
    text_file: &str,
) -> String {
    format!(
        "{},{}",
        build_band_pad(spec),
        build_drawtext(spec, layout, font_file, text_file)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_for(spec: &CaptionSpec) -> CaptionLayout {
        CaptionLayout::compute(spec)
    }

    #[test]
    fn test_top_band_shifts_picture_down() {
        let spec = CaptionSpec::new("hi", CaptionPosition::Top);
        let pad = build_band_pad(&spec);
        assert_eq!(pad, "pad=iw:ih+100:0:100:color=white");
    }

    #[test]
    fn test_bottom_band_extends_below() {
        let spec = CaptionSpec::new("hi", CaptionPosition::Bottom);
        let pad = build_band_pad(&spec);
        assert_eq!(pad, "pad=iw:ih+100:0:0:color=white");
    }

    #[test]
    fn test_drawtext_uses_layout_geometry() {
        let spec = CaptionSpec::new("hi", CaptionPosition::Bottom);
        let layout = layout_for(&spec);
        let filter = build_drawtext(&spec, &layout, "font.ttf", "caption.txt");

        assert!(filter.contains("textfile=caption.txt"));
        assert!(filter.contains("fontfile=font.ttf"));
        assert!(filter.contains("fontsize=36"));
        assert!(filter.contains("fontcolor=black"));
        assert!(filter.contains("line_spacing=4"));
        assert!(filter.contains("y=h-61"));
        assert!(filter.contains("x=(w-text_w)/2"));
    }

    #[test]
    fn test_full_filter_pads_before_drawing() {
        let spec = CaptionSpec::new("hi", CaptionPosition::Top);
        let layout = layout_for(&spec);
        let filter = build_caption_filter(&spec, &layout, "font.ttf", "caption.txt");

        let pad_pos = filter.find("pad=").unwrap();
        let draw_pos = filter.find("drawtext=").unwrap();
        assert!(pad_pos < draw_pos);
    }

    #[test]
    fn test_custom_colors() {
        let mut spec = CaptionSpec::new("hi", CaptionPosition::Top);
        spec.band_color = "0x101010".to_string();
        spec.font_color = "yellow".to_string();
        let layout = layout_for(&spec);
        let filter = build_caption_filter(&spec, &layout, "f.ttf", "t.txt");

        assert!(filter.contains("color=0x101010"));
        assert!(filter.contains("fontcolor=yellow"));
    }
}
