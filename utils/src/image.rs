use candle_core::{bail, DType, Result, Tensor};

/// Clamps every channel value into the closed range [0, 1].
pub fn clamp_unit(image: &Tensor) -> Result<Tensor> {
    image.to_dtype(DType::F32)?.clamp(0f32, 1f32)
}

/// Returns the image as a `(N, C, H, W)` tensor.
///
/// Single images are laid out `(C, H, W)` and get a batch axis of one.
pub fn to_batched(image: &Tensor) -> Result<Tensor> {
    match image.rank() {
        3 => image.unsqueeze(0),
        4 => Ok(image.clone()),
        rank => bail!(
            "expected a (C, H, W) or (N, C, H, W) image, got rank {} {:?}",
            rank,
            image.dims()
        ),
    }
}
