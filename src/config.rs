use crate::dims::PadMode;
use crate::error::{InvalidArgument, Result};
use crate::fft::{DeconvFloat, FftDomain};
use serde::{Deserialize, Serialize};

/// Parameters of a Richardson-Lucy restoration.
///
/// Missing fields fall back to their defaults when deserializing, so `{"pad_mode": "none"}` is
/// a complete configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichardsonLucyConfig {
    /// Padding applied to the data before it is transformed.
    pub pad_mode: PadMode,
    /// Use real-to-complex transforms instead of complex ones.
    pub real_domain_fft: bool,
    /// Blurred estimates below this value yield a ratio of zero instead of a division.
    pub epsilon: f64,
    /// Constant the estimate starts from on the whole padded domain.
    pub initial_estimate: f64,
}

impl Default for RichardsonLucyConfig {
    fn default() -> Self {
        RichardsonLucyConfig {
            pad_mode: PadMode::Log2,
            real_domain_fft: false,
            epsilon: 1e-6,
            initial_estimate: 0.5,
        }
    }
}

impl RichardsonLucyConfig {
    pub fn domain(&self) -> FftDomain {
        FftDomain::from_real_domain_only(self.real_domain_fft)
    }

    /// Checks the scalar parameters and converts them to the working float type.
    ///
    /// Returns `(epsilon, initial_estimate)`.
    pub(crate) fn scalars<T: DeconvFloat>(&self) -> Result<(T, T)> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(InvalidArgument::Epsilon(self.epsilon).into());
        }
        if !self.initial_estimate.is_finite() || self.initial_estimate <= 0.0 {
            return Err(InvalidArgument::InitialEstimate(self.initial_estimate).into());
        }
        let epsilon = T::from_f64(self.epsilon).ok_or(InvalidArgument::Epsilon(self.epsilon))?;
        let initial = T::from_f64(self.initial_estimate)
            .ok_or(InvalidArgument::InitialEstimate(self.initial_estimate))?;
        Ok((epsilon, initial))
    }
}
