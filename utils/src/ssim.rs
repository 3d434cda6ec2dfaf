// Structural similarity (SSIM) between two images.
//
// Local statistics are gathered with a normalized Gaussian window applied to
// every channel independently (grouped convolution, zero padding). The score
// is the mean of the per-pixel SSIM map, so 1.0 means identical images.

use candle_core::{bail, DType, Device, Result, Tensor};

use crate::image::to_batched;

pub const WINDOW_SIZE: usize = 11;
pub const WINDOW_SIGMA: f64 = 1.5;

// Stabilizers for a dynamic range of 1.0
const C1: f64 = 0.01 * 0.01;
const C2: f64 = 0.03 * 0.03;

/// Builds a `(channels, 1, size, size)` Gaussian kernel whose taps sum to 1.
pub fn gaussian_window(
    size: usize,
    sigma: f64,
    channels: usize,
    device: &Device,
) -> Result<Tensor> {
    let center = (size / 2) as f64;
    let taps: Vec<f64> = (0..size)
        .map(|x| {
            let d = x as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = taps.iter().sum();
    let taps: Vec<f32> = taps.iter().map(|t| (t / total) as f32).collect();

    let column = Tensor::from_vec(taps, (size, 1), device)?;
    let window = column.matmul(&column.t()?)?;

    window
        .reshape((1, 1, size, size))?
        .broadcast_as((channels, 1, size, size))?
        .contiguous()
}

/// Mean SSIM between `rendered` and `reference`.
///
/// Both images must share the same `(C, H, W)` or `(N, C, H, W)` shape.
pub fn ssim(rendered: &Tensor, reference: &Tensor) -> Result<f64> {
    let x = to_batched(&rendered.to_dtype(DType::F32)?)?;
    let y = to_batched(&reference.to_dtype(DType::F32)?)?;

    if x.dims() != y.dims() {
        bail!(
            "cannot compare images of different shapes: {:?} vs {:?}",
            rendered.dims(),
            reference.dims()
        );
    }

    let channels = x.dim(1)?;
    let window = gaussian_window(WINDOW_SIZE, WINDOW_SIGMA, channels, x.device())?;
    let padding = WINDOW_SIZE / 2;
    let filter = |t: &Tensor| t.conv2d(&window, padding, 1, 1, channels);

    let mu_x = filter(&x)?;
    let mu_y = filter(&y)?;

    let mu_x_sq = mu_x.sqr()?;
    let mu_y_sq = mu_y.sqr()?;
    let mu_xy = (&mu_x * &mu_y)?;

    let sigma_x_sq = (filter(&x.sqr()?)? - &mu_x_sq)?;
    let sigma_y_sq = (filter(&y.sqr()?)? - &mu_y_sq)?;
    let sigma_xy = (filter(&(&x * &y)?)? - &mu_xy)?;

    let luminance = mu_xy.affine(2.0, C1)?;
    let structure = sigma_xy.affine(2.0, C2)?;
    let numerator = (luminance * structure)?;

    let luminance_norm = (mu_x_sq + mu_y_sq)?.affine(1.0, C1)?;
    let structure_norm = (sigma_x_sq + sigma_y_sq)?.affine(1.0, C2)?;
    let denominator = (luminance_norm * structure_norm)?;

    let map = (numerator / denominator)?;
    map.mean_all()?.to_dtype(DType::F64)?.to_scalar::<f64>()
}
