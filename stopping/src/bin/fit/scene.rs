// A synthetic scene: one smooth pattern seen through differently exposed,
// noisy cameras. The fitted model is a single learnable image; rendering a
// view applies that view's exposure gain.

use candle_core::{DType, Device, Result as CandleResult, Tensor};
use candle_nn::{ops::sigmoid, Init, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stopping::EvaluationView;

use crate::args::Args;

const MIN_GAIN: f64 = 0.6;
const MAX_GAIN: f64 = 1.0;

pub struct View {
    reference: Tensor,
    gain: f64,
}

impl View {
    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl EvaluationView for View {
    fn reference(&self) -> &Tensor {
        &self.reference
    }
}

pub struct Scene {
    pub train_views: Vec<View>,
    pub test_views: Vec<View>,
}

impl Scene {
    pub fn generate(args: &Args, device: &Device) -> CandleResult<Self> {
        let mut rng = StdRng::seed_from_u64(args.seed);
        let pattern = pattern(args.channels, args.size);

        let mut make_views = |count: usize| -> CandleResult<Vec<View>> {
            (0..count)
                .map(|_| {
                    let gain = rng.gen_range(MIN_GAIN..=MAX_GAIN);
                    let pixels: Vec<f32> = pattern
                        .iter()
                        .map(|p| {
                            let jitter = if args.noise > 0.0 {
                                rng.gen_range(-args.noise..=args.noise)
                            } else {
                                0.0
                            };
                            (p * gain as f32 + jitter).clamp(0.0, 1.0)
                        })
                        .collect();
                    let reference =
                        Tensor::from_vec(pixels, (args.channels, args.size, args.size), device)?;
                    Ok(View { reference, gain })
                })
                .collect()
        };

        let train_views = make_views(args.views)?;
        let test_views = make_views(args.test_views)?;

        Ok(Self {
            train_views,
            test_views,
        })
    }
}

/// The learnable image, stored as logits so renders stay inside [0, 1].
pub struct Model {
    logits: Tensor,
}

impl Model {
    pub fn new(
        varmap: &VarMap,
        channels: usize,
        size: usize,
        device: &Device,
    ) -> CandleResult<Self> {
        let vs = VarBuilder::from_varmap(varmap, DType::F32, device);
        let logits = vs.get_with_hints((channels, size, size), "image", Init::Const(0.0))?;
        Ok(Self { logits })
    }

    pub fn render(&self, view: &View) -> CandleResult<Tensor> {
        sigmoid(&self.logits)?.affine(view.gain(), 0.0)
    }
}

fn pattern(channels: usize, size: usize) -> Vec<f32> {
    let scale = std::f32::consts::TAU / size as f32;
    let mut pixels = Vec::with_capacity(channels * size * size);
    for c in 0..channels {
        let phase = c as f32;
        for y in 0..size {
            for x in 0..size {
                let wave = (x as f32 * scale + phase).sin() * (y as f32 * scale * 0.5).cos();
                pixels.push(0.5 + 0.4 * wave);
            }
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args() -> Args {
        Args::parse_from(["fit", "--views", "3", "--test-views", "2", "--size", "8"])
    }

    #[test]
    fn test_generate_is_seeded() -> CandleResult<()> {
        let a = Scene::generate(&args(), &Device::Cpu)?;
        let b = Scene::generate(&args(), &Device::Cpu)?;

        assert_eq!(a.train_views.len(), 3);
        assert_eq!(a.test_views.len(), 2);

        for (x, y) in a.train_views.iter().zip(&b.train_views) {
            assert_eq!(x.gain(), y.gain());
            let diff = (x.reference() - y.reference())?.abs()?.sum_all()?.to_scalar::<f32>()?;
            assert_eq!(diff, 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_references_are_in_unit_range() -> CandleResult<()> {
        let scene = Scene::generate(&args(), &Device::Cpu)?;
        for view in scene.train_views.iter().chain(&scene.test_views) {
            assert_eq!(view.reference().dims(), &[3, 8, 8]);
            assert!(view.reference().min_all()?.to_scalar::<f32>()? >= 0.0);
            assert!(view.reference().max_all()?.to_scalar::<f32>()? <= 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_render_applies_gain() -> CandleResult<()> {
        let scene = Scene::generate(&args(), &Device::Cpu)?;
        let varmap = VarMap::new();
        let model = Model::new(&varmap, 3, 8, &Device::Cpu)?;

        let view = &scene.test_views[0];
        let rendered = model.render(view)?;
        assert_eq!(rendered.dims(), &[3, 8, 8]);

        // Zero logits render mid-grey scaled by the exposure
        let mean = rendered.mean_all()?.to_scalar::<f32>()?;
        assert!((mean as f64 - 0.5 * view.gain()).abs() < 1e-5);
        Ok(())
    }
}
