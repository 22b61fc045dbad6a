//! Marker colors.

use std::fmt;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Fixed color for anchors.
pub const ANCHOR_COLOR: Rgb = Rgb::new(30, 174, 219);

/// Sensor palette, indexed from 1.
pub const SENSOR_PALETTE: [Rgb; 8] = [
    Rgb::new(139, 92, 246), // #8B5CF6
    Rgb::new(217, 70, 239), // #D946EF
    Rgb::new(249, 115, 22), // #F97316
    Rgb::new(6, 182, 212),  // #06B6D4
    Rgb::new(34, 197, 94),  // #22C55E
    Rgb::new(234, 179, 8),  // #EAB308
    Rgb::new(236, 72, 153), // #EC4899
    Rgb::new(20, 184, 166), // #14B8A6
];

/// Resolve a sensor color index. Anything outside 1..=8 falls back to 1.
pub fn sensor_color(index: Option<i64>) -> Rgb {
    match index {
        Some(i @ 1..=8) => SENSOR_PALETTE[(i - 1) as usize],
        _ => SENSOR_PALETTE[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_palette_is_distinct_and_stable() {
        let colors: HashSet<Rgb> = (1..=8).map(|i| sensor_color(Some(i))).collect();
        assert_eq!(colors.len(), 8);
        assert!(!colors.contains(&ANCHOR_COLOR));

        for i in 1..=8 {
            assert_eq!(sensor_color(Some(i)), sensor_color(Some(i)));
        }
    }

    #[test]
    fn test_out_of_range_falls_back_to_first() {
        let first = sensor_color(Some(1));
        for i in [0, -1, 9, 100, i64::MIN, i64::MAX] {
            assert_eq!(sensor_color(Some(i)), first);
        }
        assert_eq!(sensor_color(None), first);
    }

    #[test]
    fn test_css_format() {
        assert_eq!(sensor_color(Some(3)).to_string(), "rgb(249, 115, 22)");
        assert_eq!(ANCHOR_COLOR.to_string(), "rgb(30, 174, 219)");
    }
}
