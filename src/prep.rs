//! Pre- and post-processing hooks around the restoration.
//!
//! Hooks are plain callbacks keyed by the role of the array they receive, so a kernel hook can
//! never be applied to the observed image by accident.

use crate::fft::DeconvFloat;
use ndarray::{ArrayD, ArrayViewD};

/// Role of an input array handed to an input hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputRole {
    /// The observed image.
    Data,
    /// The point-spread function.
    Kernel,
}

/// Input hook: receives each input with its role and returns the array to use instead.
pub type InputPrepFn<T> = dyn Fn(InputRole, ArrayD<T>) -> ArrayD<T> + Send + Sync;

/// Output hook: receives the cropped estimate and the prepared inputs.
pub type OutputPrepFn<T> = dyn Fn(ArrayD<T>, &PreparedInputs<'_, T>) -> ArrayD<T> + Send + Sync;

/// The inputs after the input hook ran, as seen by the output hook.
#[derive(Debug, Clone)]
pub struct PreparedInputs<'a, T> {
    pub data: ArrayViewD<'a, T>,
    pub kernel: ArrayViewD<'a, T>,
}

/// Default input hook. Scales the kernel so that it sums to one and passes the data through.
///
/// A kernel summing to zero (or to a non-finite value) cannot be normalized and is returned
/// unchanged.
pub fn normalize_kernel_sum_to_one<T: DeconvFloat>(role: InputRole, tensor: ArrayD<T>) -> ArrayD<T> {
    match role {
        InputRole::Data => tensor,
        InputRole::Kernel => {
            let sum = tensor.sum();
            if sum == T::zero() || !sum.is_finite() {
                log::warn!("kernel sum is {:?}, skipping normalization", sum);
                return tensor;
            }
            tensor.mapv_into(|v| v / sum)
        }
    }
}

/// Output hook that returns the estimate unchanged.
pub fn identity_output<T>(result: ArrayD<T>, _inputs: &PreparedInputs<'_, T>) -> ArrayD<T> {
    result
}

/// Builds an output hook clamping every value of the result into `[min, max]`.
pub fn clip_output<T: DeconvFloat>(
    min: T,
    max: T,
) -> impl Fn(ArrayD<T>, &PreparedInputs<'_, T>) -> ArrayD<T> + Send + Sync {
    move |result: ArrayD<T>, _inputs: &PreparedInputs<'_, T>| result.mapv_into(|v| v.max(min).min(max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = array![[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]].into_dyn();
        let normalized = normalize_kernel_sum_to_one(InputRole::Kernel, kernel);
        assert_relative_eq!(normalized.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(normalized[[1, 1]], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_data_passes_through() {
        let data = array![3.0f32, 4.0, 5.0].into_dyn();
        let out = normalize_kernel_sum_to_one(InputRole::Data, data.clone());
        assert_eq!(out, data);
    }

    #[test]
    fn test_zero_kernel_is_left_alone() {
        let kernel = array![0.0, 0.0, 0.0].into_dyn();
        let out = normalize_kernel_sum_to_one(InputRole::Kernel, kernel.clone());
        assert_eq!(out, kernel);
    }

    #[test]
    fn test_clip_output() {
        let data = array![1.0, 2.0].into_dyn();
        let kernel = array![1.0].into_dyn();
        let inputs = PreparedInputs {
            data: data.view(),
            kernel: kernel.view(),
        };
        let clip = clip_output(0.5, 1.5);
        let clipped = clip(array![0.1, 1.0, 7.0].into_dyn(), &inputs);
        assert_eq!(clipped, array![0.5, 1.0, 1.5].into_dyn());
        assert_eq!(identity_output(clipped.clone(), &inputs), clipped);
    }
}
