//! Centered padding and circular shifts.
//!
//! The kernel is defined with its peak at the centre of its support while circular
//! convolution expects the impulse origin at index 0. The helpers here move arrays between
//! the two layouts and in and out of the larger, FFT friendly shape.
//!
//! Offsets follow a single rule on every axis: an array of extent `n` placed into extent `m`
//! starts at `m / 2 - n / 2`. Index `n / 2` therefore always lands on `m / 2`, which is the
//! position [`ifftshift`] moves to index 0. When the total amount of padding is odd, the extra
//! element goes to the start if `m` is even and `n` is odd, and to the end otherwise.

use crate::error::{InvalidArgument, Result};
use ndarray::{Array, ArrayBase, ArrayD, Axis, Data, Dimension, IxDyn, Slice};
use num_traits::Zero;

/// Start offset of an extent `inner` centred within an extent `outer`.
fn center_offset(inner: usize, outer: usize) -> usize {
    outer / 2 - inner / 2
}

fn check_fits(inner: &[usize], outer: &[usize]) -> Result<()> {
    if inner.len() != outer.len() {
        return Err(InvalidArgument::RankMismatch {
            data: outer.len(),
            kernel: inner.len(),
        }
        .into());
    }
    if let Some(axis) = (0..inner.len()).find(|&axis| inner[axis] > outer[axis]) {
        return Err(InvalidArgument::TargetTooSmall {
            axis,
            extent: inner[axis],
            target: outer[axis],
        }
        .into());
    }
    Ok(())
}

/// Embeds `tensor` into a zero-filled array of `target_shape`, centred along every axis.
///
/// # Errors
/// Fails with [`InvalidArgument::RankMismatch`] if the ranks differ and with
/// [`InvalidArgument::TargetTooSmall`] if any target extent is smaller than the tensor.
pub fn pad_around_center<A, S, D>(tensor: &ArrayBase<S, D>, target_shape: &[usize]) -> Result<ArrayD<A>>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_fits(tensor.shape(), target_shape)?;

    let mut padded = ArrayD::<A>::zeros(IxDyn(target_shape));
    let shape = tensor.shape();
    padded
        .slice_each_axis_mut(|ax| {
            let i = ax.axis.index();
            let start = center_offset(shape[i], ax.len);
            Slice::from(start..start + shape[i])
        })
        .assign(&tensor.view().into_dyn());
    Ok(padded)
}

/// Extracts the centred region of `original_shape` from a larger tensor.
///
/// This is the exact inverse of [`pad_around_center`]:
/// `unpad_around_center(&pad_around_center(&x, s)?, x.shape())? == x`.
///
/// # Errors
/// Same conditions as [`pad_around_center`], with the roles of the shapes swapped.
pub fn unpad_around_center<A, S, D>(tensor: &ArrayBase<S, D>, original_shape: &[usize]) -> Result<ArrayD<A>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    check_fits(original_shape, tensor.shape())?;

    let view = tensor.view().into_dyn();
    let cropped = view.slice_each_axis(|ax| {
        let i = ax.axis.index();
        let start = center_offset(original_shape[i], ax.len);
        Slice::from(start..start + original_shape[i])
    });
    Ok(cropped.to_owned())
}

/// Circularly shifts `x` by `shift(len)` positions on every axis, so that
/// `out[i] = x[(i - shift) mod len]`.
fn roll<A, S, D>(x: &ArrayBase<S, D>, shift: impl Fn(usize) -> usize) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut out = x.to_owned();
    for axis in 0..x.ndim() {
        let axis = Axis(axis);
        let n = out.len_of(axis);
        if n == 0 {
            continue;
        }
        let s = shift(n) % n;
        if s == 0 {
            continue;
        }
        let mut rolled = out.clone();
        rolled
            .slice_axis_mut(axis, Slice::from(s..))
            .assign(&out.slice_axis(axis, Slice::from(..n - s)));
        rolled
            .slice_axis_mut(axis, Slice::from(..s))
            .assign(&out.slice_axis(axis, Slice::from(n - s..)));
        out = rolled;
    }
    out
}

/// Moves the zero-frequency element (index 0) to the centre of every axis.
pub fn fftshift<A, S, D>(x: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    roll(x, |n| n / 2)
}

/// Inverse of [`fftshift`]: moves the centre element (index `len / 2`) of every axis to index 0.
pub fn ifftshift<A, S, D>(x: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    roll(x, |n| n - n / 2)
}

/// Reverses every axis around index 0, `out[i] = x[(len - i) mod len]`.
///
/// For a real kernel whose origin sits at index 0 the spectrum of the result is the complex
/// conjugate of the kernel spectrum.
pub fn flip_around_origin<A, S, D>(x: &ArrayBase<S, D>) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut reversed = x.to_owned();
    for axis in 0..reversed.ndim() {
        reversed.invert_axis(Axis(axis));
    }
    roll(&reversed, |_| 1)
}
