//! Target shapes for the frequency domain.
//!
//! Most FFT implementations run much faster on lengths with small prime factors, so the
//! data is padded before it is transformed. [`PadMode`] selects how far.

use crate::error::{DeconvolutionError, InvalidArgument};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Padding applied to the data before transforming it.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// Every axis is padded up to the next power of two.
    #[default]
    Log2,
    /// The data shape is used as is.
    None,
}

impl Display for PadMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PadMode::Log2 => {
                write!(f, "log2")
            }
            PadMode::None => {
                write!(f, "none")
            }
        }
    }
}

impl FromStr for PadMode {
    type Err = DeconvolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log2" => Ok(PadMode::Log2),
            "none" => Ok(PadMode::None),
            _ => Err(InvalidArgument::PadMode(s.to_string()).into()),
        }
    }
}

/// Computes the shape the data is padded to before it enters the frequency domain.
///
/// Every returned extent is `>=` the corresponding input extent. With [`PadMode::None`] the
/// input shape is returned unchanged, with [`PadMode::Log2`] each axis is rounded up to the
/// next power of two on its own.
pub fn optimize_dims(shape: &[usize], mode: PadMode) -> Vec<usize> {
    match mode {
        PadMode::None => shape.to_vec(),
        PadMode::Log2 => shape.iter().map(|&n| n.next_power_of_two()).collect(),
    }
}

/// Smallest length `>= n` that factors into 2, 3 and 5 only.
///
/// Not used by [`PadMode::Log2`], but handy for transforms that only need a fast length
/// instead of a power of two.
pub fn next_fast_len(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut candidate = n;
    loop {
        let mut m = candidate;
        for p in [2, 3, 5] {
            while m % p == 0 {
                m /= p;
            }
        }
        if m == 1 {
            return candidate;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log2_rounds_each_axis_up() {
        assert_eq!(optimize_dims(&[5, 8, 9], PadMode::Log2), vec![8, 8, 16]);
        assert_eq!(optimize_dims(&[1, 2, 3], PadMode::Log2), vec![1, 2, 4]);
        assert_eq!(optimize_dims(&[1000], PadMode::Log2), vec![1024]);
    }

    #[test]
    fn test_none_keeps_shape() {
        assert_eq!(optimize_dims(&[5, 7, 9], PadMode::None), vec![5, 7, 9]);
    }

    #[test]
    fn test_pad_mode_parsing() {
        assert_eq!("log2".parse::<PadMode>().unwrap(), PadMode::Log2);
        assert_eq!("NONE".parse::<PadMode>().unwrap(), PadMode::None);

        let err = "log3".parse::<PadMode>().unwrap_err();
        assert!(matches!(
            err,
            DeconvolutionError::InvalidArgument(InvalidArgument::PadMode(ref s)) if s == "log3"
        ));
    }

    #[test]
    fn test_pad_mode_display_round_trips() {
        for mode in [PadMode::Log2, PadMode::None] {
            assert_eq!(mode.to_string().parse::<PadMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_next_fast_len() {
        assert_eq!(next_fast_len(1), 1);
        assert_eq!(next_fast_len(7), 8);
        assert_eq!(next_fast_len(11), 12);
        assert_eq!(next_fast_len(17), 18);
        assert_eq!(next_fast_len(64), 64);
        assert_eq!(next_fast_len(121), 125);
    }
}
