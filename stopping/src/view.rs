use candle_core::Tensor;

/// A held-out view the controller scores renders against.
pub trait EvaluationView {
    /// Ground-truth image laid out `(C, H, W)`, on any device.
    fn reference(&self) -> &Tensor;
}

impl EvaluationView for Tensor {
    fn reference(&self) -> &Tensor {
        self
    }
}

impl<V: EvaluationView + ?Sized> EvaluationView for &V {
    fn reference(&self) -> &Tensor {
        (**self).reference()
    }
}
