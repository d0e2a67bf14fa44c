// Normalized compression distance.
//
//   NCD(x, y) = (C(x·d·y) − min(C(x), C(y))) / max(C(x), C(y))
//
// where d is a delimiter the compressor can see, so the boundary between the
// two texts is explicit rather than a silent byte seam.
//
// Real compressors saturate: unrelated text pairs all land just under 1.0.
// The optional saturation rescale stretches the band above `threshold` into
// [floor, floor + (1 − threshold) × stretch] to get some resolution back. It
// distorts the metric on purpose and must be applied identically to every
// compressor whose matrices are compared.

use serde::{Deserialize, Serialize};

use crate::compression::Compressor;

/// Delimiter placed between the two texts of a concatenation.
pub const DEFAULT_DELIMITER: &str = "\n###DELIMITER###\n";

/// Piecewise-linear stretch applied to saturated NCD values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationRescale {
    /// Values strictly above this are rescaled (default 0.9).
    pub threshold: f64,
    /// Where `threshold` lands after rescaling (default 0.5).
    pub floor: f64,
    /// Slope of the stretch (default 5.0).
    pub stretch: f64,
}

impl Default for SaturationRescale {
    fn default() -> Self {
        Self {
            threshold: 0.9,
            floor: 0.5,
            stretch: 5.0,
        }
    }
}

impl SaturationRescale {
    pub fn apply(&self, ncd: f64) -> f64 {
        if ncd > self.threshold {
            self.floor + (ncd - self.threshold) * self.stretch
        } else {
            ncd
        }
    }
}

/// Everything that shapes an NCD value besides the compressor itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NcdPolicy {
    pub delimiter: String,
    /// `None` reports the raw NCD.
    pub rescale: Option<SaturationRescale>,
}

impl Default for NcdPolicy {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            rescale: Some(SaturationRescale::default()),
        }
    }
}

/// The sizes behind one NCD value, kept for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NcdMeasurement {
    pub size_x: f64,
    pub size_y: f64,
    pub size_xy: f64,
    /// NCD before the saturation rescale.
    pub raw: f64,
    /// NCD after the saturation rescale (equal to `raw` when disabled).
    pub value: f64,
}

/// Computes NCD between text samples under a fixed policy.
#[derive(Debug, Clone, Default)]
pub struct NcdCalculator {
    pub policy: NcdPolicy,
}

impl NcdCalculator {
    pub fn new(policy: NcdPolicy) -> Self {
        Self { policy }
    }

    /// Full measurement, or `None` when the pair is not computable: a
    /// compressor returned its failure sentinel, or both texts compress to
    /// nothing.
    pub fn measure(&self, x: &str, y: &str, compressor: &dyn Compressor) -> Option<NcdMeasurement> {
        let cx = compressor.compress(x);
        let cy = compressor.compress(y);

        let mut xy = String::with_capacity(x.len() + self.policy.delimiter.len() + y.len());
        xy.push_str(x);
        xy.push_str(&self.policy.delimiter);
        xy.push_str(y);
        let cxy = compressor.compress(&xy);

        if cx.is_failure() || cy.is_failure() || cxy.is_failure() {
            return None;
        }

        let max = cx.size.max(cy.size);
        if max <= 0.0 {
            return None;
        }
        let min = cx.size.min(cy.size);
        let raw = (cxy.size - min) / max;
        let value = match &self.policy.rescale {
            Some(rescale) => rescale.apply(raw),
            None => raw,
        };

        Some(NcdMeasurement {
            size_x: cx.size,
            size_y: cy.size,
            size_xy: cxy.size,
            raw,
            value,
        })
    }

    /// The (possibly rescaled) NCD of `x` and `y`.
    pub fn ncd(&self, x: &str, y: &str, compressor: &dyn Compressor) -> Option<f64> {
        self.measure(x, y, compressor).map(|m| m.value)
    }
}
