//! Richardson-Lucy deconvolution of N-dimensional images in the frequency domain.
//!
//! ```no_run
//! use fft_deconvolution::{gaussian_kernel, restore, RichardsonLucyConfig};
//! use ndarray::ArrayD;
//!
//! # fn main() -> fft_deconvolution::Result<()> {
//! let blurred = ArrayD::<f64>::ones(ndarray::IxDyn(&[64, 48]));
//! let kernel = gaussian_kernel::<f64>(&[9, 9], &[2.0, 2.0])?;
//! let restored = restore(&blurred, &kernel, 25, &RichardsonLucyConfig::default())?;
//! assert_eq!(restored.data.shape(), blurred.shape());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dims;
pub mod error;
pub mod fft;
pub mod pad;
pub mod prep;
pub mod psf;
pub mod restoration;

pub use config::RichardsonLucyConfig;
pub use dims::{optimize_dims, PadMode};
pub use error::{DeconvolutionError, InvalidArgument, Result};
pub use fft::{DeconvFloat, FftDomain, FftPair};
pub use pad::{fftshift, ifftshift, pad_around_center, unpad_around_center};
pub use prep::{InputRole, PreparedInputs};
pub use psf::{gaussian_kernel, point_source};
pub use restoration::{
    restore, richardson_lucy, Acquisition, DeconvolutionInfo, DeconvolutionResult, RichardsonLucy,
};
