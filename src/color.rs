use palette::{Hsl, IntoColor, Srgb};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Volcano plot colours
// ---------------------------------------------------------------------------

/// Every pull-down protein.
pub const ALL_PROTEINS: RGBColor = RGBColor(0x5D, 0xAD, 0xE2);
/// Significant proteins / top ratios.
pub const HIGHLIGHT: RGBColor = RGBColor(0xFF, 0xD7, 0x00);
/// Guide lines and grid.
pub const GUIDE: RGBColor = RGBColor(0xE5, 0xE8, 0xE8);
pub const GUIDE_TEXT: RGBColor = RGBColor(0x56, 0x65, 0x73);

/// The lab's usual band colours, used first.
const BAND_COLORS: [RGBColor; 6] = [
    RGBColor(0x8E, 0x44, 0xAD),
    RGBColor(0x2E, 0xCC, 0x71),
    RGBColor(0xFF, 0x3B, 0x58),
    RGBColor(0xD5, 0xA0, 0xBB),
    RGBColor(0xB8, 0x74, 0x39),
    RGBColor(0x1F, 0x61, 0x8D),
];

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            RGBColor(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Colours for `n` band series: the fixed six, then generated hues.
pub fn band_colors(n: usize) -> Vec<RGBColor> {
    let mut colors: Vec<RGBColor> = BAND_COLORS.iter().copied().take(n).collect();
    if n > BAND_COLORS.len() {
        colors.extend(generate_palette(n - BAND_COLORS.len()));
    }
    colors
}
