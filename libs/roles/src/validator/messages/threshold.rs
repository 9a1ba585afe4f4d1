//! Voting threshold.
#![allow(clippy::float_arithmetic)]

/// Number of votes required to decide a (height, round, stage).
///
/// `required = ceil(total * percent / 100)`, clamped to `total`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ThresholdRepr", into = "ThresholdRepr")]
pub struct Threshold {
    total: u32,
    percent: f64,
    required: u32,
}

/// Error returned when constructing an invalid `Threshold`.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdError {
    /// There are no voters.
    #[error("total must be at least 1")]
    ZeroTotal,
    /// Percent is not a number within [1, 100].
    #[error("percent {0} is out of range [1, 100]")]
    PercentOutOfRange(f64),
}

impl Threshold {
    /// Constructs a threshold of `percent`% out of `total` voters.
    pub fn new(total: u32, percent: f64) -> Result<Self, ThresholdError> {
        if total == 0 {
            return Err(ThresholdError::ZeroTotal);
        }
        if !(1. ..=100.).contains(&percent) {
            return Err(ThresholdError::PercentOutOfRange(percent));
        }
        // Multiply first, so that integral percents yield exact results.
        let required = (f64::from(total) * percent / 100.).ceil();
        // `required` is within [0.01, total] here, the cast cannot truncate.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let required = (required as u32).clamp(1, total);
        Ok(Self {
            total,
            percent,
            required,
        })
    }

    /// Total number of voters.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Percent of the voters required to agree.
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Number of votes required for a majority.
    pub fn required(&self) -> u32 {
        self.required
    }

    /// Checks that the threshold is consistent.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        Self::new(self.total, self.percent).map(|_| ())
    }

    /// Canonical encoding: `u32_LE(total) ∥ f64_LE(percent)`.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut b = [0; 12];
        b[..4].copy_from_slice(&self.total.to_le_bytes());
        b[4..].copy_from_slice(&self.percent.to_le_bytes());
        b
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ThresholdRepr {
    total: u32,
    percent: f64,
}

impl TryFrom<ThresholdRepr> for Threshold {
    type Error = ThresholdError;
    fn try_from(r: ThresholdRepr) -> Result<Self, Self::Error> {
        Self::new(r.total, r.percent)
    }
}

impl From<Threshold> for ThresholdRepr {
    fn from(t: Threshold) -> Self {
        Self {
            total: t.total,
            percent: t.percent,
        }
    }
}
