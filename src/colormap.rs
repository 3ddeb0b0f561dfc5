//! Continuous color scale with a per-metric polarity.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// ColorBrewer RdYlGn, four classes, unfavorable (red) to favorable (green).
pub const RD_YL_GN: [Rgb; 4] = [
    Rgb(0xd7, 0x19, 0x1c),
    Rgb(0xfd, 0xae, 0x61),
    Rgb(0xa6, 0xd9, 0x6a),
    Rgb(0x1a, 0x96, 0x41),
];

/// Which end of a metric's range is good news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Low values get the favorable color (fares).
    LowerIsBetter,
    /// High values get the favorable color (passenger volume).
    HigherIsBetter,
}

/// Value range with `min < max` guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Observed range of `values`, widened by 1 when degenerate. `None` when
    /// there are no finite values.
    pub fn observed<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(Self::widened(min, max))
    }

    pub fn widened(min: f64, max: f64) -> Self {
        if min == max {
            log::debug!("min and max both {min:.2}; widening max to {:.2}", min + 1.0);
            Self { min, max: min + 1.0 }
        } else {
            Self { min, max }
        }
    }

    /// Position of `value` in the range, in `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    stops: &'static [Rgb],
    range: ValueRange,
    polarity: Polarity,
}

impl ColorScale {
    /// `stops` run from the unfavorable to the favorable color.
    pub fn new(stops: &'static [Rgb], range: ValueRange, polarity: Polarity) -> Self {
        Self {
            stops,
            range,
            polarity,
        }
    }

    pub fn red_yellow_green(range: ValueRange, polarity: Polarity) -> Self {
        Self::new(&RD_YL_GN, range, polarity)
    }

    pub fn favorable(&self) -> Rgb {
        self.stops[self.stops.len() - 1]
    }

    pub fn unfavorable(&self) -> Rgb {
        self.stops[0]
    }

    /// Color at the low end of the range.
    pub fn low_color(&self) -> Rgb {
        self.color(self.range.min)
    }

    /// Color at the high end of the range.
    pub fn high_color(&self) -> Rgb {
        self.color(self.range.max)
    }

    pub fn color(&self, value: f64) -> Rgb {
        let t = self.range.normalize(value);
        let favorability = match self.polarity {
            Polarity::LowerIsBetter => 1.0 - t,
            Polarity::HigherIsBetter => t,
        };
        self.sample(favorability)
    }

    fn sample(&self, t: f64) -> Rgb {
        let segments = self.stops.len() - 1;
        if segments == 0 {
            return self.stops[0];
        }
        let scaled = t * segments as f64;
        let i = (scaled.floor() as usize).min(segments - 1);
        self.stops[i].lerp(self.stops[i + 1], scaled - i as f64)
    }

    /// CSS gradient from the low end to the high end, for legends.
    pub fn css_gradient(&self) -> String {
        let steps = 8;
        let colors: Vec<String> = (0..=steps)
            .map(|i| {
                let v = self.range.min + (self.range.max - self.range.min) * f64::from(i) / f64::from(steps);
                self.color(v).to_hex()
            })
            .collect();
        format!("linear-gradient(to right, {})", colors.join(", "))
    }
}
