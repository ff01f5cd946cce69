//! N-dimensional forward/inverse FFT pairs on `ndarray` arrays.
//!
//! [`select`] plans a matched pair of transforms for a fixed shape. Two domains are available:
//!
//! * [`FftDomain::Complex`]: every axis is transformed with a complex-to-complex FFT and all
//!   spectra have the full shape.
//! * [`FftDomain::Real`]: the last axis uses a real-to-complex transform, so spectra only keep
//!   the `n / 2 + 1` non-redundant bins of that axis. The remaining axes are complex.
//!
//! Both pairs are normalized so that `inverse(forward(x)) == x` up to rounding, and both give
//! the same convolution results for real inputs. Lanes of every axis are transformed in
//! parallel on the rayon thread pool.

use crate::error::{InvalidArgument, Result};
use crate::pad::flip_around_origin;
use ndarray::{ArrayD, Axis, IxDyn, Zip};
use num_complex::Complex;
use num_traits::{Float, Zero};
use rayon::prelude::*;
use realfft::{ComplexToReal, FftError, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftNum, FftPlanner, Length};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Floating point types the transforms and the restoration run on (`f32` and `f64`).
pub trait DeconvFloat: FftNum + Float {}

impl<T: FftNum + Float> DeconvFloat for T {}

/// Domain the frequency-space computations are carried out in.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FftDomain {
    /// Complex-to-complex transforms on all axes.
    #[default]
    Complex,
    /// Real-to-complex transform on the last axis, Hermitian half spectra.
    Real,
}

impl FftDomain {
    pub fn from_real_domain_only(real_domain_only: bool) -> Self {
        if real_domain_only {
            FftDomain::Real
        } else {
            FftDomain::Complex
        }
    }
}

impl Display for FftDomain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FftDomain::Complex => {
                write!(f, "complex")
            }
            FftDomain::Real => {
                write!(f, "real")
            }
        }
    }
}

/// A matched forward/inverse transform pair planned for one spatial shape.
pub trait FftPair<T: DeconvFloat>: Send + Sync {
    /// Domain of this pair.
    fn domain(&self) -> FftDomain;

    /// Spatial shape the pair was planned for.
    fn shape(&self) -> &[usize];

    /// Shape of the spectra produced by [`FftPair::forward`].
    fn spectrum_shape(&self) -> Vec<usize>;

    /// Forward transform of a real array of [`FftPair::shape`].
    fn forward(&self, input: &ArrayD<T>) -> Result<ArrayD<Complex<T>>>;

    /// Normalized inverse transform, returning the real part.
    fn inverse(&self, spectrum: ArrayD<Complex<T>>) -> Result<ArrayD<T>>;

    /// Spectrum of the kernel mirrored through the origin, i.e. the conjugate response used for
    /// back-projection.
    ///
    /// `kernel` is the spatial kernel (origin at index 0) and `kernel_spectrum` its forward
    /// transform; each domain uses whichever of the two it can handle natively.
    fn conjugate_spectrum(
        &self,
        kernel: &ArrayD<T>,
        kernel_spectrum: &ArrayD<Complex<T>>,
    ) -> Result<ArrayD<Complex<T>>>;
}

/// Plans a transform pair for `shape` in the given domain.
///
/// # Errors
/// Fails with [`InvalidArgument::EmptyRank`] for a zero-dimensional shape and with
/// [`InvalidArgument::EmptyAxis`] if any extent is zero.
pub fn select<T: DeconvFloat>(shape: &[usize], domain: FftDomain) -> Result<Box<dyn FftPair<T>>> {
    if shape.is_empty() {
        return Err(InvalidArgument::EmptyRank.into());
    }
    if let Some(axis) = shape.iter().position(|&n| n == 0) {
        return Err(InvalidArgument::EmptyAxis { axis }.into());
    }
    Ok(match domain {
        FftDomain::Complex => Box::new(ComplexFft::new(shape)),
        FftDomain::Real => Box::new(RealFft::new(shape)),
    })
}

/// Convolves `signal` with the kernel whose spectrum is `kernel_spectrum`:
/// `inverse(forward(signal) * kernel_spectrum)`.
pub fn convolve<T: DeconvFloat>(
    pair: &dyn FftPair<T>,
    signal: &ArrayD<T>,
    kernel_spectrum: &ArrayD<Complex<T>>,
) -> Result<ArrayD<T>> {
    let mut spectrum = pair.forward(signal)?;
    check_shape(&pair.spectrum_shape(), kernel_spectrum.shape())?;
    Zip::from(&mut spectrum)
        .and(kernel_spectrum)
        .par_for_each(|s, &k| *s = *s * k);
    pair.inverse(spectrum)
}

fn check_shape(expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(InvalidArgument::TransformShape {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
        .into());
    }
    Ok(())
}

fn inverse_scale<T: DeconvFloat>(shape: &[usize]) -> T {
    let len: usize = shape.iter().product();
    T::from_usize(len).map_or(T::one(), |n| T::one() / n)
}

/// In-place complex transform of every lane along `axis`.
fn transform_lanes<T: DeconvFloat>(data: &mut ArrayD<Complex<T>>, axis: usize, fft: &Arc<dyn Fft<T>>) {
    let len = fft.len();
    if len <= 1 {
        return;
    }
    let scratch_len = fft.get_inplace_scratch_len();
    Zip::from(data.lanes_mut(Axis(axis)))
        .into_par_iter()
        .for_each_init(
            || (vec![Complex::zero(); len], vec![Complex::zero(); scratch_len]),
            |(buffer, scratch), (mut lane,)| {
                buffer.iter_mut().zip(lane.iter()).for_each(|(b, v)| *b = *v);
                fft.process_with_scratch(buffer, scratch);
                lane.iter_mut().zip(buffer.iter()).for_each(|(v, b)| *v = *b);
            },
        );
}

/// Complex-to-complex transforms on every axis.
pub struct ComplexFft<T: DeconvFloat> {
    shape: Vec<usize>,
    forward: Vec<Arc<dyn Fft<T>>>,
    inverse: Vec<Arc<dyn Fft<T>>>,
}

impl<T: DeconvFloat> ComplexFft<T> {
    pub fn new(shape: &[usize]) -> Self {
        let mut planner = FftPlanner::<T>::new();
        let forward = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inverse = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        ComplexFft {
            shape: shape.to_vec(),
            forward,
            inverse,
        }
    }
}

impl<T: DeconvFloat> FftPair<T> for ComplexFft<T> {
    fn domain(&self) -> FftDomain {
        FftDomain::Complex
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn spectrum_shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn forward(&self, input: &ArrayD<T>) -> Result<ArrayD<Complex<T>>> {
        check_shape(&self.shape, input.shape())?;
        let mut data = input.mapv(|v| Complex::new(v, T::zero()));
        for (axis, fft) in self.forward.iter().enumerate() {
            transform_lanes(&mut data, axis, fft);
        }
        Ok(data)
    }

    fn inverse(&self, mut spectrum: ArrayD<Complex<T>>) -> Result<ArrayD<T>> {
        check_shape(&self.shape, spectrum.shape())?;
        for (axis, fft) in self.inverse.iter().enumerate() {
            transform_lanes(&mut spectrum, axis, fft);
        }
        let scale = inverse_scale::<T>(&self.shape);
        Ok(spectrum.mapv(|c| c.re * scale))
    }

    fn conjugate_spectrum(
        &self,
        _kernel: &ArrayD<T>,
        kernel_spectrum: &ArrayD<Complex<T>>,
    ) -> Result<ArrayD<Complex<T>>> {
        check_shape(&self.shape, kernel_spectrum.shape())?;
        Ok(kernel_spectrum.mapv(|c| c.conj()))
    }
}

/// Real-to-complex transform on the last axis followed by complex transforms on the others.
pub struct RealFft<T: DeconvFloat> {
    shape: Vec<usize>,
    r2c: Arc<dyn RealToComplex<T>>,
    c2r: Arc<dyn ComplexToReal<T>>,
    forward: Vec<Arc<dyn Fft<T>>>,
    inverse: Vec<Arc<dyn Fft<T>>>,
}

impl<T: DeconvFloat> RealFft<T> {
    pub fn new(shape: &[usize]) -> Self {
        let last = shape.len().saturating_sub(1);
        let mut real_planner = RealFftPlanner::<T>::new();
        let r2c = real_planner.plan_fft_forward(shape.get(last).copied().unwrap_or(1));
        let c2r = real_planner.plan_fft_inverse(shape.get(last).copied().unwrap_or(1));

        let mut planner = FftPlanner::<T>::new();
        let outer = &shape[..last];
        let forward = outer.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inverse = outer.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        RealFft {
            shape: shape.to_vec(),
            r2c,
            c2r,
            forward,
            inverse,
        }
    }

    fn last_axis(&self) -> usize {
        self.shape.len() - 1
    }
}

impl<T: DeconvFloat> FftPair<T> for RealFft<T> {
    fn domain(&self) -> FftDomain {
        FftDomain::Real
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn spectrum_shape(&self) -> Vec<usize> {
        let mut shape = self.shape.clone();
        let last = self.last_axis();
        shape[last] = self.r2c.complex_len();
        shape
    }

    fn forward(&self, input: &ArrayD<T>) -> Result<ArrayD<Complex<T>>> {
        check_shape(&self.shape, input.shape())?;
        let last = Axis(self.last_axis());
        let mut spectrum = ArrayD::<Complex<T>>::zeros(IxDyn(&self.spectrum_shape()));

        let r2c = &self.r2c;
        Zip::from(input.lanes(last))
            .and(spectrum.lanes_mut(last))
            .into_par_iter()
            .try_for_each_init(
                || (r2c.make_input_vec(), r2c.make_output_vec(), r2c.make_scratch_vec()),
                |(input_buf, output_buf, scratch), (lane, mut out_lane)| {
                    input_buf.iter_mut().zip(lane.iter()).for_each(|(b, v)| *b = *v);
                    r2c.process_with_scratch(input_buf, output_buf, scratch)?;
                    out_lane.iter_mut().zip(output_buf.iter()).for_each(|(v, b)| *v = *b);
                    Ok::<(), FftError>(())
                },
            )?;

        for (axis, fft) in self.forward.iter().enumerate() {
            transform_lanes(&mut spectrum, axis, fft);
        }
        Ok(spectrum)
    }

    fn inverse(&self, mut spectrum: ArrayD<Complex<T>>) -> Result<ArrayD<T>> {
        check_shape(&self.spectrum_shape(), spectrum.shape())?;
        for (axis, fft) in self.inverse.iter().enumerate() {
            transform_lanes(&mut spectrum, axis, fft);
        }

        let last = Axis(self.last_axis());
        let n = self.shape[self.last_axis()];
        let scale = inverse_scale::<T>(&self.shape);
        let mut output = ArrayD::<T>::zeros(IxDyn(&self.shape));

        let c2r = &self.c2r;
        Zip::from(spectrum.lanes(last))
            .and(output.lanes_mut(last))
            .into_par_iter()
            .try_for_each_init(
                || (c2r.make_input_vec(), c2r.make_output_vec(), c2r.make_scratch_vec()),
                |(input_buf, output_buf, scratch), (lane, mut out_lane)| {
                    input_buf.iter_mut().zip(lane.iter()).for_each(|(b, v)| *b = *v);
                    // DC and Nyquist bins of a real signal are real; drop rounding residue
                    if let Some(first) = input_buf.first_mut() {
                        first.im = T::zero();
                    }
                    if n % 2 == 0 {
                        if let Some(nyquist) = input_buf.last_mut() {
                            nyquist.im = T::zero();
                        }
                    }
                    c2r.process_with_scratch(input_buf, output_buf, scratch)?;
                    out_lane
                        .iter_mut()
                        .zip(output_buf.iter())
                        .for_each(|(v, b)| *v = *b * scale);
                    Ok::<(), FftError>(())
                },
            )?;
        Ok(output)
    }

    fn conjugate_spectrum(
        &self,
        kernel: &ArrayD<T>,
        _kernel_spectrum: &ArrayD<Complex<T>>,
    ) -> Result<ArrayD<Complex<T>>> {
        self.forward(&flip_around_origin(kernel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, ArrayD, IxDyn};

    fn wavy(shape: &[usize]) -> ArrayD<f64> {
        let len: usize = shape.iter().product();
        let values = (0..len)
            .map(|i| ((i as f64) * 0.731).sin().abs() + 0.1 * (i % 3) as f64)
            .collect();
        ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
    }

    fn max_abs_diff(a: &ArrayD<f64>, b: &ArrayD<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_known_one_dimensional_spectra() {
        for domain in [FftDomain::Complex, FftDomain::Real] {
            let pair = select::<f64>(&[4], domain).unwrap();

            let impulse = array![1.0, 0.0, 0.0, 0.0].into_dyn();
            let spectrum = pair.forward(&impulse).unwrap();
            for c in spectrum.iter() {
                assert_abs_diff_eq!(c.re, 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-12);
            }

            let flat = array![1.0, 1.0, 1.0, 1.0].into_dyn();
            let spectrum = pair.forward(&flat).unwrap();
            assert_abs_diff_eq!(spectrum[[0]].re, 4.0, epsilon = 1e-12);
            for c in spectrum.iter().skip(1) {
                assert_abs_diff_eq!(c.norm(), 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_round_trip_is_identity() {
        for shape in [vec![7], vec![4, 6], vec![5, 3, 2], vec![2, 3, 4, 5]] {
            for domain in [FftDomain::Complex, FftDomain::Real] {
                let pair = select::<f64>(&shape, domain).unwrap();
                let x = wavy(&shape);
                let restored = pair.inverse(pair.forward(&x).unwrap()).unwrap();
                assert!(
                    max_abs_diff(&restored, &x) < 1e-12,
                    "{} round trip failed for {:?}",
                    domain,
                    shape
                );
            }
        }
    }

    #[test]
    fn test_real_spectrum_is_half_of_complex_spectrum() {
        let shape = [3, 6];
        let x = wavy(&shape);
        let full = select::<f64>(&shape, FftDomain::Complex).unwrap().forward(&x).unwrap();
        let real_pair = select::<f64>(&shape, FftDomain::Real).unwrap();
        let half = real_pair.forward(&x).unwrap();
        assert_eq!(half.shape(), &[3, 4]);
        assert_eq!(real_pair.spectrum_shape(), vec![3, 4]);
        for i in 0..3 {
            for j in 0..4 {
                let a = full[[i, j]];
                let b = half[[i, j]];
                assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
                assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_conjugate_spectra_agree_across_domains() {
        let shape = [5, 4];
        let kernel = wavy(&shape);

        let complex = select::<f64>(&shape, FftDomain::Complex).unwrap();
        let k_full = complex.forward(&kernel).unwrap();
        let conj_full = complex.conjugate_spectrum(&kernel, &k_full).unwrap();

        let real = select::<f64>(&shape, FftDomain::Real).unwrap();
        let k_half = real.forward(&kernel).unwrap();
        let conj_half = real.conjugate_spectrum(&kernel, &k_half).unwrap();

        for (idx, c) in conj_half.indexed_iter() {
            let expected = conj_full[&idx];
            assert_abs_diff_eq!(c.re, expected.re, epsilon = 1e-12);
            assert_abs_diff_eq!(c.im, expected.im, epsilon = 1e-12);
            let direct = k_half[&idx].conj();
            assert_abs_diff_eq!(c.re, direct.re, epsilon = 1e-12);
            assert_abs_diff_eq!(c.im, direct.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_convolve_with_shifted_impulse_rolls_signal() {
        let shape = [4, 5];
        let x = wavy(&shape);
        let mut kernel = ArrayD::<f64>::zeros(IxDyn(&shape));
        kernel[[1, 2]] = 1.0;

        for domain in [FftDomain::Complex, FftDomain::Real] {
            let pair = select::<f64>(&shape, domain).unwrap();
            let k = pair.forward(&kernel).unwrap();
            let y = convolve(pair.as_ref(), &x, &k).unwrap();
            for i in 0..4 {
                for j in 0..5 {
                    let expected = x[[(i + 4 - 1) % 4, (j + 5 - 2) % 5]];
                    assert_abs_diff_eq!(y[[i, j]], expected, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_select_rejects_degenerate_shapes() {
        assert!(matches!(
            select::<f32>(&[], FftDomain::Complex),
            Err(crate::DeconvolutionError::InvalidArgument(InvalidArgument::EmptyRank))
        ));
        assert!(matches!(
            select::<f32>(&[4, 0], FftDomain::Real),
            Err(crate::DeconvolutionError::InvalidArgument(InvalidArgument::EmptyAxis { axis: 1 }))
        ));
    }

    #[test]
    fn test_forward_rejects_wrong_shape() {
        let pair = select::<f64>(&[4, 4], FftDomain::Real).unwrap();
        let err = pair.forward(&wavy(&[4, 5])).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
