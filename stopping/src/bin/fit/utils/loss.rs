use candle_core::{Result as CandleResult, Tensor};

// Residuals beyond this are penalized linearly
const L1_THRESHOLD: f64 = 0.1;

/// Smooth L1 loss between a render and its reference, averaged over pixels.
pub fn smooth_l1(rendered: &Tensor, reference: &Tensor) -> CandleResult<Tensor> {
    let diff = (rendered - reference)?;
    let abs_diff = diff.abs()?;

    let is_small = abs_diff.lt(L1_THRESHOLD)?;

    let quadratic = (diff.sqr()? * (0.5 / L1_THRESHOLD))?;
    let linear = (abs_diff - 0.5 * L1_THRESHOLD)?;

    let loss = is_small.where_cond(&quadratic, &linear)?;
    loss.mean_all()
}
