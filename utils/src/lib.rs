pub mod image;
pub mod ssim;

pub use image::{clamp_unit, to_batched};
pub use ssim::{gaussian_window, ssim};
