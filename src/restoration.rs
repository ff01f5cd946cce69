//! Richardson-Lucy deconvolution in the frequency domain.
//!
//! The update rule follows the usual formulation:
//!
//! ```text
//! conv1    = real(IFFT(FFT(estimate) * K))
//! ratio    = conv1 < epsilon ? 0 : data / conv1
//! conv2    = real(IFFT(FFT(ratio) * conj(K)))
//! estimate = max(estimate * conv2, 0)
//! ```
//!
//! where `K` is the spectrum of the kernel after it has been padded to the working shape and
//! shifted so that its centre sits on index 0.
//!
//! Reference implementations consulted for the details (initial estimate, division guard,
//! positivity constraint):
//! - Matlab `deconvlucy`
//! - scikit-image `restoration.richardson_lucy`
//! - DeconvolutionLab2 `RichardsonLucy`

use crate::config::RichardsonLucyConfig;
use crate::dims::{optimize_dims, PadMode};
use crate::error::{InvalidArgument, Result};
use crate::fft::{self, DeconvFloat};
use crate::pad::{ifftshift, pad_around_center, unpad_around_center};
use crate::prep::{
    normalize_kernel_sum_to_one, InputPrepFn, InputRole, OutputPrepFn, PreparedInputs,
};
use ndarray::{Array, ArrayBase, ArrayD, Data, Dimension, IxDyn, Zip};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// An observed image together with the point-spread function that blurred it.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition<T> {
    pub data: ArrayD<T>,
    pub kernel: ArrayD<T>,
    /// Ground truth, if known. Only used for evaluating results, never by the algorithm.
    pub actual: Option<ArrayD<T>>,
}

impl<T> Acquisition<T> {
    pub fn new<D: Dimension>(data: Array<T, D>, kernel: Array<T, D>) -> Self {
        Acquisition {
            data: data.into_dyn(),
            kernel: kernel.into_dyn(),
            actual: None,
        }
    }

    pub fn with_actual<D: Dimension>(mut self, actual: Array<T, D>) -> Self {
        self.actual = Some(actual.into_dyn());
        self
    }
}

/// Diagnostics of a restoration. Reserved for convergence information, not filled in yet.
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct DeconvolutionInfo {}

/// Outcome of a restoration.
#[derive(Debug, Clone, PartialEq)]
pub struct DeconvolutionResult<T> {
    /// Restored image with the shape of the observed data.
    pub data: ArrayD<T>,
    /// Always `None` for now.
    pub info: Option<DeconvolutionInfo>,
}

/// Richardson-Lucy deconvolver.
///
/// Holds the configuration and the preparation hooks. Every call to [`RichardsonLucy::run`]
/// or [`RichardsonLucy::restore`] is self-contained: the kernel spectrum, padded buffers and
/// estimate are created for that call and dropped when it returns, so one instance can serve
/// any number of calls, also from several threads at once.
#[derive(Clone)]
pub struct RichardsonLucy<T: DeconvFloat> {
    config: RichardsonLucyConfig,
    input_prep: Option<Arc<InputPrepFn<T>>>,
    output_prep: Option<Arc<OutputPrepFn<T>>>,
}

impl<T: DeconvFloat> Debug for RichardsonLucy<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RichardsonLucy")
            .field("config", &self.config)
            .field("input_prep", &self.input_prep.is_some())
            .field("output_prep", &self.output_prep.is_some())
            .finish()
    }
}

impl<T: DeconvFloat> Default for RichardsonLucy<T> {
    fn default() -> Self {
        RichardsonLucy::new(RichardsonLucyConfig::default())
    }
}

impl<T: DeconvFloat> RichardsonLucy<T> {
    /// Creates a deconvolver that normalizes the kernel to sum to one and leaves the result
    /// untouched.
    pub fn new(config: RichardsonLucyConfig) -> Self {
        let input_prep: Arc<InputPrepFn<T>> = Arc::new(normalize_kernel_sum_to_one::<T>);
        RichardsonLucy {
            config,
            input_prep: Some(input_prep),
            output_prep: None,
        }
    }

    pub fn config(&self) -> &RichardsonLucyConfig {
        &self.config
    }

    pub fn with_pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.config.pad_mode = pad_mode;
        self
    }

    pub fn with_real_domain_fft(mut self, real_domain_fft: bool) -> Self {
        self.config.real_domain_fft = real_domain_fft;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    pub fn with_initial_estimate(mut self, initial_estimate: f64) -> Self {
        self.config.initial_estimate = initial_estimate;
        self
    }

    /// Replaces the input hook.
    pub fn with_input_prep<F>(mut self, prep: F) -> Self
    where
        F: Fn(InputRole, ArrayD<T>) -> ArrayD<T> + Send + Sync + 'static,
    {
        self.input_prep = Some(Arc::new(prep));
        self
    }

    /// Removes the input hook, including the default kernel normalization.
    pub fn without_input_prep(mut self) -> Self {
        self.input_prep = None;
        self
    }

    /// Sets a hook applied to the cropped result, e.g. [`crate::prep::clip_output`].
    pub fn with_output_prep<F>(mut self, prep: F) -> Self
    where
        F: Fn(ArrayD<T>, &PreparedInputs<'_, T>) -> ArrayD<T> + Send + Sync + 'static,
    {
        self.output_prep = Some(Arc::new(prep));
        self
    }

    /// Restores `acquisition` with `niter` iterations.
    pub fn run(&self, acquisition: &Acquisition<T>, niter: usize) -> Result<DeconvolutionResult<T>> {
        self.restore(&acquisition.data, &acquisition.kernel, niter)
    }

    /// Restores `data`, blurred by `kernel`, with `niter` iterations.
    ///
    /// `niter == 0` is valid and returns the initial estimate cropped to the data shape.
    ///
    /// # Errors
    /// [`InvalidArgument`] if the ranks differ, an axis is empty, a kernel axis is longer than
    /// the matching data axis, or `epsilon`/`initial_estimate` are out of range. All checks run
    /// before any array is copied.
    pub fn restore<S, SK, D>(
        &self,
        data: &ArrayBase<S, D>,
        kernel: &ArrayBase<SK, D>,
        niter: usize,
    ) -> Result<DeconvolutionResult<T>>
    where
        S: Data<Elem = T>,
        SK: Data<Elem = T>,
        D: Dimension,
    {
        validate_shapes(data.shape(), kernel.shape())?;
        let (epsilon, initial) = self.config.scalars::<T>()?;

        let data = self.prepare(InputRole::Data, data.to_owned().into_dyn());
        let kernel = self.prepare(InputRole::Kernel, kernel.to_owned().into_dyn());
        validate_shapes(data.shape(), kernel.shape())?;

        let target = optimize_dims(data.shape(), self.config.pad_mode);
        let domain = self.config.domain();
        log::debug!(
            "richardson-lucy: data {:?}, kernel {:?}, padded {:?}, {} domain, {} iterations",
            data.shape(),
            kernel.shape(),
            target,
            domain,
            niter
        );

        let data_padded = pad_around_center(&data, &target)?;
        let kernel_padded = ifftshift(&pad_around_center(&kernel, &target)?);

        let pair = fft::select::<T>(&target, domain)?;
        let kern_fft = pair.forward(&kernel_padded)?;
        let kern_fft_conj = pair.conjugate_spectrum(&kernel_padded, &kern_fft)?;

        let mut estimate = ArrayD::from_elem(IxDyn(&target), initial);
        for i in 1..=niter {
            // blur of the current estimate
            let mut ratio = fft::convolve(pair.as_ref(), &estimate, &kern_fft)?;
            Zip::from(&mut ratio)
                .and(&data_padded)
                .par_for_each(|c, &d| *c = if *c < epsilon { T::zero() } else { d / *c });

            // back-projection through the mirrored kernel
            let correction = fft::convolve(pair.as_ref(), &ratio, &kern_fft_conj)?;
            Zip::from(&mut estimate)
                .and(&correction)
                .par_for_each(|e, &c| *e = (*e * c).max(T::zero()));

            log::trace!("richardson-lucy: iteration {}/{} done", i, niter);
        }

        let result = unpad_around_center(&estimate, data.shape())?;
        let result = match &self.output_prep {
            Some(prep) => {
                let inputs = PreparedInputs {
                    data: data.view(),
                    kernel: kernel.view(),
                };
                prep(result, &inputs)
            }
            None => result,
        };
        log::debug!("richardson-lucy: finished {} iterations", niter);

        Ok(DeconvolutionResult {
            data: result,
            info: None,
        })
    }

    fn prepare(&self, role: InputRole, tensor: ArrayD<T>) -> ArrayD<T> {
        match &self.input_prep {
            Some(prep) => prep(role, tensor),
            None => tensor,
        }
    }
}

/// Checks that `kernel_shape` fits into `data_shape`.
fn validate_shapes(data_shape: &[usize], kernel_shape: &[usize]) -> Result<()> {
    if data_shape.len() != kernel_shape.len() {
        return Err(InvalidArgument::RankMismatch {
            data: data_shape.len(),
            kernel: kernel_shape.len(),
        }
        .into());
    }
    if data_shape.is_empty() {
        return Err(InvalidArgument::EmptyRank.into());
    }
    for (axis, (&d, &k)) in data_shape.iter().zip(kernel_shape).enumerate() {
        if d == 0 || k == 0 {
            return Err(InvalidArgument::EmptyAxis { axis }.into());
        }
        if d < k {
            return Err(InvalidArgument::KernelExceedsData {
                axis,
                data: d,
                kernel: k,
            }
            .into());
        }
    }
    Ok(())
}

/// Restores `data` with the default hooks and the given configuration.
pub fn restore<T, S, SK, D>(
    data: &ArrayBase<S, D>,
    kernel: &ArrayBase<SK, D>,
    niter: usize,
    config: &RichardsonLucyConfig,
) -> Result<DeconvolutionResult<T>>
where
    T: DeconvFloat,
    S: Data<Elem = T>,
    SK: Data<Elem = T>,
    D: Dimension,
{
    RichardsonLucy::new(*config).restore(data, kernel, niter)
}

/// Restores an acquisition with default settings apart from the padding mode and returns only
/// the image.
pub fn richardson_lucy<T: DeconvFloat>(
    acquisition: &Acquisition<T>,
    niter: usize,
    pad_mode: PadMode,
) -> Result<ArrayD<T>> {
    let deconvolver = RichardsonLucy::default().with_pad_mode(pad_mode);
    Ok(deconvolver.run(acquisition, niter)?.data)
}
