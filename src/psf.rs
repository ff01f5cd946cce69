//! Synthetic point-spread functions and test objects.

use crate::error::{InvalidArgument, Result};
use crate::fft::DeconvFloat;
use ndarray::{ArrayD, IxDyn};

/// Builds a separable Gaussian kernel normalized to sum to one.
///
/// The peak sits at index `n / 2` of every axis, the position [`crate::pad::ifftshift`] moves
/// to the origin.
///
/// # Arguments
/// - `shape` (*&[usize]*): The extent of the kernel along every axis.
/// - `sigma` (*&[f64]*): The standard deviation along every axis, in samples.
///
/// # Returns
/// - (*ArrayD<T>*): The kernel, `exp(-x² / (2 σ²))` per axis multiplied together.
///
/// # Errors
/// - [`InvalidArgument::RankMismatch`] if `sigma` and `shape` differ in length.
/// - [`InvalidArgument::EmptyRank`] or [`InvalidArgument::EmptyAxis`] for degenerate shapes.
/// - [`InvalidArgument::Sigma`] if a sigma is not finite and positive.
pub fn gaussian_kernel<T: DeconvFloat>(shape: &[usize], sigma: &[f64]) -> Result<ArrayD<T>> {
    if shape.len() != sigma.len() {
        return Err(InvalidArgument::RankMismatch {
            data: shape.len(),
            kernel: sigma.len(),
        }
        .into());
    }
    if shape.is_empty() {
        return Err(InvalidArgument::EmptyRank.into());
    }
    if let Some(axis) = shape.iter().position(|&n| n == 0) {
        return Err(InvalidArgument::EmptyAxis { axis }.into());
    }
    if let Some(axis) = sigma.iter().position(|&s| !s.is_finite() || s <= 0.0) {
        return Err(InvalidArgument::Sigma { axis }.into());
    }

    // one profile per axis, the kernel is their outer product
    let profiles: Vec<Vec<f64>> = shape
        .iter()
        .zip(sigma)
        .map(|(&n, &s)| {
            let center = (n / 2) as f64;
            (0..n)
                .map(|i| (-(i as f64 - center).powi(2) / (2.0 * s * s)).exp())
                .collect()
        })
        .collect();

    let kernel = ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        profiles
            .iter()
            .enumerate()
            .map(|(axis, profile)| profile[idx[axis]])
            .product::<f64>()
    });
    let sum = kernel.sum();
    Ok(kernel.mapv(|v| T::from_f64(v / sum).unwrap_or_else(T::zero)))
}

/// Zero array of `shape` with a single point of `amplitude` at `position`.
pub fn point_source<T: DeconvFloat>(shape: &[usize], position: &[usize], amplitude: T) -> Result<ArrayD<T>> {
    if shape.len() != position.len() {
        return Err(InvalidArgument::RankMismatch {
            data: shape.len(),
            kernel: position.len(),
        }
        .into());
    }
    if let Some(axis) = (0..shape.len()).find(|&axis| position[axis] >= shape[axis]) {
        return Err(InvalidArgument::PointOutOfBounds {
            axis,
            index: position[axis],
            extent: shape[axis],
        }
        .into());
    }
    let mut out = ArrayD::<T>::zeros(IxDyn(shape));
    out[position] = amplitude;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_kernel_is_normalized_and_centred() {
        let kernel = gaussian_kernel::<f64>(&[7, 6], &[1.5, 0.8]).unwrap();
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-12);

        let (peak, _) = kernel
            .indexed_iter()
            .fold((IxDyn(&[0, 0]), f64::MIN), |(best, max), (idx, &v)| {
                if v > max {
                    (idx, v)
                } else {
                    (best, max)
                }
            });
        assert_eq!(peak, IxDyn(&[3, 3]));

        // symmetric around the centre on the odd axis
        for i in 0..3 {
            assert_relative_eq!(kernel[[3 - i - 1, 2]], kernel[[3 + i + 1, 2]], epsilon = 1e-15);
        }
    }

    #[test]
    fn test_gaussian_kernel_rejects_bad_arguments() {
        assert!(matches!(
            gaussian_kernel::<f32>(&[5, 5], &[1.0]),
            Err(crate::DeconvolutionError::InvalidArgument(InvalidArgument::RankMismatch { .. }))
        ));
        assert!(matches!(
            gaussian_kernel::<f32>(&[5, 5], &[1.0, 0.0]),
            Err(crate::DeconvolutionError::InvalidArgument(InvalidArgument::Sigma { axis: 1 }))
        ));
        assert!(gaussian_kernel::<f32>(&[5, 0], &[1.0, 1.0])
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_point_source() {
        let point = point_source(&[4, 5, 3], &[1, 4, 2], 7.0f32).unwrap();
        assert_eq!(point[[1, 4, 2]], 7.0);
        assert_eq!(point.sum(), 7.0);

        assert!(matches!(
            point_source(&[4, 5], &[1, 5], 1.0f64),
            Err(crate::DeconvolutionError::InvalidArgument(InvalidArgument::PointOutOfBounds {
                axis: 1,
                index: 5,
                extent: 5
            }))
        ));
    }
}
