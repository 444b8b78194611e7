//! Maps recall probability to the colour used for word tiles.

use std::fmt;

/// Below this recall the tile is drawn in the neutral faded colour
pub const FADED_THRESHOLD: f64 = 0.1;

pub const MEMORY_HUE: f64 = 130.0;
const SATURATION_RANGE: (f64, f64) = (20.0, 80.0);
const LIGHTNESS_RANGE: (f64, f64) = (35.0, 60.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemoryColor {
    /// Rendered as `#444`
    Faded,
    Hsl {
        hue: f64,
        saturation: f64,
        lightness: f64,
    },
}

/// Colour for a recall probability.
///
/// Saturation and lightness rise linearly from the faded threshold to full
/// recall, so brighter tiles always mean higher recall.
pub fn memory_color(recall: f64) -> MemoryColor {
    if recall.is_nan() || recall < FADED_THRESHOLD {
        return MemoryColor::Faded;
    }
    let t = (recall.min(1.0) - FADED_THRESHOLD) / (1.0 - FADED_THRESHOLD);
    MemoryColor::Hsl {
        hue: MEMORY_HUE,
        saturation: lerp(SATURATION_RANGE, t),
        lightness: lerp(LIGHTNESS_RANGE, t),
    }
}

fn lerp((low, high): (f64, f64), t: f64) -> f64 {
    low + (high - low) * t
}

impl fmt::Display for MemoryColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryColor::Faded => f.write_str("#444"),
            MemoryColor::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({hue}, {saturation:.1}%, {lightness:.1}%)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(color: MemoryColor) -> (f64, f64) {
        match color {
            MemoryColor::Hsl {
                saturation,
                lightness,
                ..
            } => (saturation, lightness),
            MemoryColor::Faded => panic!("expected an hsl colour"),
        }
    }

    #[test]
    fn test_faded_below_threshold() {
        assert_eq!(memory_color(0.0), MemoryColor::Faded);
        assert_eq!(memory_color(0.099), MemoryColor::Faded);
        assert_eq!(memory_color(f64::NAN), MemoryColor::Faded);
        assert_eq!(memory_color(0.05).to_string(), "#444");
    }

    #[test]
    fn test_anchors() {
        assert_eq!(components(memory_color(0.1)), (20.0, 35.0));
        assert_eq!(components(memory_color(1.0)), (80.0, 60.0));
        assert_eq!(components(memory_color(1.5)), (80.0, 60.0));
    }

    #[test]
    fn test_monotonic() {
        let mut previous = components(memory_color(0.1));
        for step in 1..=90 {
            let current = components(memory_color(0.1 + step as f64 * 0.01));
            assert!(current.0 >= previous.0 && current.1 >= previous.1);
            previous = current;
        }
    }

    #[test]
    fn test_css_rendering() {
        assert_eq!(memory_color(1.0).to_string(), "hsl(130, 80.0%, 60.0%)");
        assert_eq!(memory_color(0.55).to_string(), "hsl(130, 50.0%, 47.5%)");
    }
}
