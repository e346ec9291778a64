//! Deterministic colour assignment for labelled series.
//!
//! The first colour of the base palette is reserved for the primary series; everything after
//! it is shuffled with the same seeded generator that produced any extension colours.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Red, blue, green, orange, yellow, purple.
pub const BASE_HUES: [u16; 6] = [0, 240, 120, 30, 59, 280];

pub const DEFAULT_SEED: u64 = 52;

const VIVID: (u8, u8) = (70, 50);
const PASTEL: (u8, u8) = (40, 70);
const EXTRA_VIVID: (u8, u8) = (75, 52);
const EXTRA_PASTEL: (u8, u8) = (38, 70);
const MAX_JITTER: i32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub fn new(hue: u16, (saturation, lightness): (u8, u8)) -> Self {
        Self {
            hue: hue % 360,
            saturation,
            lightness,
        }
    }

    pub fn to_rgb(self) -> [u8; 3] {
        let h = f64::from(self.hue) / 360.0;
        let s = f64::from(self.saturation) / 100.0;
        let l = f64::from(self.lightness) / 100.0;
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return [v, v, v];
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
    }
}

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// Vivid and pastel variants of each base hue, interleaved.
pub fn base_palette() -> Vec<Hsl> {
    BASE_HUES
        .iter()
        .flat_map(|&h| [Hsl::new(h, VIVID), Hsl::new(h, PASTEL)])
        .collect()
}

/// `n` colours, identical for identical `(n, seed)`; the first is the same for every `n >= 1`.
pub fn assign(n: usize, seed: u64) -> Vec<Hsl> {
    if n == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut colors = base_palette();

    let mut extra_needed = n.saturating_sub(colors.len());
    let mut i = 0;
    while extra_needed > 0 {
        let base = i32::from(BASE_HUES[i % BASE_HUES.len()]);
        let jitter = rng.gen_range(-MAX_JITTER..=MAX_JITTER);
        let hue = (base + jitter).rem_euclid(360) as u16;
        let tone = if extra_needed % 2 == 0 {
            EXTRA_VIVID
        } else {
            EXTRA_PASTEL
        };
        colors.push(Hsl::new(hue, tone));
        i += 1;
        extra_needed -= 1;
    }

    let mut rest = colors.split_off(1);
    rest.shuffle(&mut rng);
    colors.extend(rest);
    colors.truncate(n);
    colors
}
