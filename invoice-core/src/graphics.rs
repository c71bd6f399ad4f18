use crate::writer::format_coord;

/// RGB color for fills and strokes, each component 0.0 to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b }
    }

    /// From 8-bit channels, e.g. `Color::from_rgb8(79, 70, 229)`.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        // Four decimals keep content streams short and stable.
        let c = |v: u8| (v as f64 / 255.0 * 10_000.0).round() / 10_000.0;
        Color {
            r: c(r),
            g: c(g),
            b: c(b),
        }
    }

    /// `r g b rg` operator.
    pub(crate) fn fill_op(&self) -> String {
        format!(
            "{} {} {} rg\n",
            format_coord(self.r),
            format_coord(self.g),
            format_coord(self.b)
        )
    }

    /// `r g b RG` operator.
    pub(crate) fn stroke_op(&self) -> String {
        format!(
            "{} {} {} RG\n",
            format_coord(self.r),
            format_coord(self.g),
            format_coord(self.b)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb8_conversion() {
        let c = Color::from_rgb8(255, 0, 51);
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.2));
    }

    #[test]
    fn operators() {
        assert_eq!(Color::WHITE.fill_op(), "1 1 1 rg\n");
        assert_eq!(Color::rgb(0.5, 0.5, 0.5).stroke_op(), "0.5 0.5 0.5 RG\n");
    }
}
