//! Mapping of percentages onto discrete colors.

use std::fmt::Display;

use log::debug;

use crate::config::JoinError;

/// Simple RGB color.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Rgb> {
        let h = s.strip_prefix('#').unwrap_or(s);
        if h.len() != 6 || !h.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
        Some(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl Display for Rgb {
    /// Format as CSS hex: #rrggbb
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The diverging red to blue palette with 11 classes (ColorBrewer RdBu).
pub const RDBU_11: [Rgb; 11] = [
    Rgb::new(0x67, 0x00, 0x1f),
    Rgb::new(0xb2, 0x18, 0x2b),
    Rgb::new(0xd6, 0x60, 0x4d),
    Rgb::new(0xf4, 0xa5, 0x82),
    Rgb::new(0xfd, 0xdb, 0xc7),
    Rgb::new(0xf7, 0xf7, 0xf7),
    Rgb::new(0xd1, 0xe5, 0xf0),
    Rgb::new(0x92, 0xc5, 0xde),
    Rgb::new(0x43, 0x93, 0xc3),
    Rgb::new(0x21, 0x66, 0xac),
    Rgb::new(0x05, 0x30, 0x61),
];

/// The fill of a feature on the map.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Fill {
    Color(Rgb),
    /// The feature has nothing to classify. Rendered transparent.
    NoData,
}

impl Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fill::Color(c) => write!(f, "{}", c),
            Fill::NoData => write!(f, "transparent"),
        }
    }
}

/// A bin of the scale. `[lower, upper)`, except the last one which also
/// contains its upper bound.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub color: Rgb,
}

/// An ordered list of contiguous bins covering `[min, max]`, each with a color.
#[derive(PartialEq, Debug, Clone)]
pub struct ColorScale {
    // Strictly increasing, at least 3 values.
    edges: Vec<f64>,
    // One per bin.
    colors: Vec<Rgb>,
}

fn invalid(reason: impl ToString) -> JoinError {
    JoinError::InvalidScale {
        reason: reason.to_string(),
    }
}

/// Samples `n` colors evenly along a palette, interpolating linearly between
/// its entries.
fn sample_palette(palette: &[Rgb], n: usize) -> Vec<Rgb> {
    if palette.len() == 1 || n == 1 {
        return vec![palette[0]; n];
    }
    let last = (palette.len() - 1) as f64;
    (0..n)
        .map(|i| {
            let pos = last * i as f64 / (n - 1) as f64;
            let lo = (pos.floor() as usize).min(palette.len() - 2);
            palette[lo].lerp(palette[lo + 1], pos - lo as f64)
        })
        .collect()
}

impl ColorScale {
    /// `bin_count` bins of equal width over `[min, max]`, colored with the
    /// RdBu palette.
    pub fn equal_bins(bin_count: usize, min: f64, max: f64) -> Result<ColorScale, JoinError> {
        if bin_count < 2 {
            return Err(invalid(format!("at least 2 bins are required, got {}", bin_count)));
        }
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(invalid(format!("empty or infinite domain [{}, {}]", min, max)));
        }
        let width = (max - min) / bin_count as f64;
        let mut edges: Vec<f64> = (0..bin_count).map(|i| min + width * i as f64).collect();
        // The last edge is exactly the maximum, whatever the rounding.
        edges.push(max);
        ColorScale::from_thresholds(&edges)
    }

    /// Bins delimited by an explicit list of edges, colored with the RdBu palette.
    pub fn from_thresholds(edges: &[f64]) -> Result<ColorScale, JoinError> {
        if edges.len() < 3 {
            return Err(invalid(format!(
                "at least 3 thresholds are required, got {}",
                edges.len()
            )));
        }
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(invalid("thresholds must be finite"));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "thresholds must be strictly increasing: {:?}",
                edges
            )));
        }
        let colors = sample_palette(&RDBU_11, edges.len() - 1);
        Ok(ColorScale {
            edges: edges.to_vec(),
            colors,
        })
    }

    /// Recolors the bins by sampling the given palette.
    pub fn with_palette(self, palette: &[Rgb]) -> Result<ColorScale, JoinError> {
        if palette.is_empty() {
            return Err(invalid("the palette is empty"));
        }
        let colors = sample_palette(palette, self.num_bins());
        Ok(ColorScale {
            edges: self.edges,
            colors,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.colors.len()
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    pub fn bins(&self) -> Vec<Bin> {
        self.edges
            .windows(2)
            .zip(self.colors.iter())
            .map(|(w, c)| Bin {
                lower: w[0],
                upper: w[1],
                color: *c,
            })
            .collect()
    }

    /// The bin containing the value, after clamping it to the domain.
    ///
    /// A value sitting exactly on an edge belongs to the bin above it, except
    /// for the maximum which belongs to the last bin. NaN has no bin.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let (min, max) = self.domain();
        let x = value.clamp(min, max);
        // Number of edges <= x, at least 1 after clamping.
        let idx = self.edges.partition_point(|e| *e <= x) - 1;
        Some(idx.min(self.num_bins() - 1))
    }

    /// The fill for a value. NaN gets the no-data marker.
    pub fn classify(&self, value: f64) -> Fill {
        match self.bin_index(value) {
            Some(idx) => Fill::Color(self.colors[idx]),
            None => {
                debug!("ColorScale::classify: no bin for {}", value);
                Fill::NoData
            }
        }
    }
}

/// `bin_count` equal bins over `domain`.
pub fn build_scale(bin_count: usize, domain: (f64, f64)) -> Result<ColorScale, JoinError> {
    ColorScale::equal_bins(bin_count, domain.0, domain.1)
}

pub fn classify(scale: &ColorScale, value: f64) -> Fill {
    scale.classify(value)
}
