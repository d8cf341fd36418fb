//! Image-to-tensor-to-image transform through a pre-trained model.

use std::path::PathBuf;

use ::image::{DynamicImage, RgbImage, RgbaImage};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::image::{self, TensorLayout, DEFAULT_MODEL_SIZE};
use crate::model::{self, InferenceEngine, ModelSource, ModelStore, OrtEngine};

/// Largest model side accepted.
const MAX_MODEL_SIZE: u32 = 4096;

/// What a panel feeds to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// The photo scaled to the model resolution.
    Original,
    /// A pencil sketch of the scaled photo.
    PencilSketch,
}

/// One input and the image the model produced from it.
#[derive(Debug, Clone)]
pub struct PanelResult {
    pub panel: Panel,
    pub input: RgbaImage,
    pub output: RgbaImage,
}

/// Configuration for the transform pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Side of the model's square input, in pixels.
    pub model_size: u32,

    /// Axis order the model expects.
    pub layout: TensorLayout,

    /// Panels to render, top to bottom.
    pub panels: Vec<Panel>,

    /// Color-dodge scale of the pencil-sketch effect. 1 reproduces the
    /// original app's nearly black sketch panel.
    pub sketch_dodge_scale: f32,

    /// Pixels between cells of the comparison sheet.
    pub gutter: u32,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Explicit model file. Overrides `model_dir` and `model_url`.
    pub model_path: Option<PathBuf>,

    /// Directory holding `model_<size>.onnx`. Defaults to the user cache.
    pub model_dir: Option<PathBuf>,

    /// Where to fetch the model from when it is not in `model_dir`.
    pub model_url: Option<String>,

    /// Intra-op threads for the runtime, 0 for its default.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_size: DEFAULT_MODEL_SIZE,
            layout: TensorLayout::Nhwc,
            panels: vec![
                Panel::Original,
                Panel::PencilSketch,
                Panel::Original,
                Panel::Original,
            ],
            sketch_dodge_scale: 256.0,
            gutter: 8,
            output_quality: 95,
            model_path: None,
            model_dir: None,
            model_url: None,
            threads: 0,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_MODEL_SIZE).contains(&self.model_size) {
            return Err(Error::invalid(
                "model_size",
                format!("must be between 1 and {MAX_MODEL_SIZE}"),
            ));
        }

        if self.panels.is_empty() {
            return Err(Error::invalid("panels", "at least one panel is required"));
        }

        if !self.sketch_dodge_scale.is_finite() || self.sketch_dodge_scale <= 0.0 {
            return Err(Error::invalid(
                "sketch_dodge_scale",
                "must be a positive number",
            ));
        }

        if self.gutter > MAX_MODEL_SIZE {
            return Err(Error::invalid(
                "gutter",
                format!("must be at most {MAX_MODEL_SIZE}"),
            ));
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::invalid("output_quality", "must be between 1 and 100"));
        }

        Ok(())
    }

    /// Where the model artifact should come from.
    #[must_use]
    pub fn model_source(&self) -> ModelSource {
        self.model_path.as_ref().map_or_else(
            || ModelSource::Cached {
                filename: model::model_filename(self.model_size),
                url: self.model_url.clone(),
            },
            |path| ModelSource::Path(path.clone()),
        )
    }
}

/// Runs photos through the model. The engine is created once and reused.
pub struct Pipeline<E = OrtEngine> {
    config: Config,
    engine: E,
}

impl Pipeline<OrtEngine> {
    /// Create a pipeline backed by ONNX Runtime.
    ///
    /// The model is located (and downloaded if a URL is configured) and
    /// loaded once here.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the model cannot
    /// be found or loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let store = match &config.model_dir {
            Some(dir) => ModelStore::at(dir)?,
            None => ModelStore::new()?,
        };
        let path = store.resolve(&config.model_source())?;
        let session = model::load_session(&path, config.threads)?;

        tracing::info!("Pipeline initialized successfully");

        Self::with_engine(config, OrtEngine::new(session))
    }
}

impl<E: InferenceEngine> Pipeline<E> {
    /// Create a pipeline around any engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_engine(config: Config, engine: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Scale `img` to the model resolution, run the model, and return the
    /// result as an opaque image of the same resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the model output is malformed.
    pub fn transform(&mut self, img: &DynamicImage) -> Result<RgbaImage> {
        let scaled = image::scale_to_model(img, self.config.model_size);
        self.infer(&scaled)
    }

    /// Model input shown for `panel`, derived from an already scaled photo.
    #[must_use]
    pub fn panel_input(&self, scaled: &RgbImage, panel: Panel) -> RgbaImage {
        match panel {
            Panel::Original => DynamicImage::ImageRgb8(scaled.clone()).to_rgba8(),
            Panel::PencilSketch => image::pencil_sketch(scaled, self.config.sketch_dodge_scale),
        }
    }

    /// Run every configured panel on `img`.
    ///
    /// Stops at the first failure; there are no partial results.
    ///
    /// # Errors
    ///
    /// Returns an error if any inference fails.
    pub fn process(&mut self, img: &DynamicImage) -> Result<Vec<PanelResult>> {
        tracing::info!(
            "Processing {}x{} image into {} panel(s)",
            img.width(),
            img.height(),
            self.config.panels.len()
        );

        let scaled = image::scale_to_model(img, self.config.model_size);

        let pb = ProgressBar::new(self.config.panels.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} Panels [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let panels = self.config.panels.clone();
        let mut results = Vec::with_capacity(panels.len());
        for panel in panels {
            let input = self.panel_input(&scaled, panel);
            let model_input = DynamicImage::ImageRgba8(input.clone()).to_rgb8();

            tracing::debug!("Running {panel:?} panel");
            let output = self.infer(&model_input)?;

            results.push(PanelResult {
                panel,
                input,
                output,
            });
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(results)
    }

    /// Run all panels and lay them out input-left, output-right.
    ///
    /// # Errors
    ///
    /// Returns an error if any inference fails.
    pub fn render_sheet(&mut self, img: &DynamicImage) -> Result<RgbaImage> {
        let pairs: Vec<_> = self
            .process(img)?
            .into_iter()
            .map(|r| (r.input, r.output))
            .collect();

        image::side_by_side(&pairs, self.config.gutter)
    }

    fn infer(&mut self, scaled: &RgbImage) -> Result<RgbaImage> {
        let input = image::rgb_to_tensor(scaled, self.config.layout);
        let output = self.engine.run(&input)?;

        if output.shape() != input.shape() {
            return Err(Error::ShapeMismatch {
                expected: format!("{:?}", input.shape()),
                actual: format!("{:?}", output.shape()),
            });
        }

        image::tensor_to_image(&output, self.config.layout)
    }
}
