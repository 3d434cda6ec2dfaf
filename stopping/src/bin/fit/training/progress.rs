use indicatif::{ProgressBar, ProgressStyle};

pub struct TrainingProgressBar {
    bar: ProgressBar,
}

impl TrainingProgressBar {
    pub fn new(num_steps: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(num_steps);
        bar.set_style(ProgressStyle::default_bar().template(
            "{spinner:.cyan} {pos}/{len} [{wide_bar:.cyan/blue}] {eta_precise} | {msg}",
        )?);
        Ok(Self { bar })
    }

    pub fn update(&self, loss: f32) {
        self.bar.set_message(format!("loss: {:.5}", loss));
        self.bar.inc(1);
    }

    pub fn checked(&self, best_ssim: f64) {
        self.bar.println(format!(
            "step {}: best held-out SSIM {:.5}",
            self.bar.position(),
            best_ssim
        ));
    }

    pub fn finish(&self, loss: f32, stopped_early: bool) {
        let reason = if stopped_early { "stopped early" } else { "done" };
        self.bar
            .set_message(format!("{}, loss: {:.5}", reason, loss));

        self.bar.finish();
    }
}
