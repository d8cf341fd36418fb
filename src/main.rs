//! sketchai CLI - run a photo through a sketch or fashion model and write a
//! side-by-side comparison sheet.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketchai::image::{save_image, TensorLayout};
use sketchai::{present, Alert, Config, ImageSource, Outcome, Panel, PanelResult, Pipeline};

/// Apply an on-device image-to-image model to a photo.
#[derive(Parser, Debug)]
#[command(name = "sketchai")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    source: SourceArg,

    /// Output path for the comparison sheet.
    #[arg(short, long, global = true, default_value = "sheet.png", value_name = "OUTPUT")]
    output: PathBuf,

    /// Model file. Defaults to model_<SIZE>.onnx in the model directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Directory holding model files.
    #[arg(long, global = true, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Download the model from this URL when it is missing.
    #[arg(long, global = true, value_name = "URL")]
    model_url: Option<String>,

    /// Side of the model's square input.
    #[arg(long, global = true, default_value = "256", value_name = "PIXELS")]
    size: u32,

    /// Tensor axis order the model expects.
    #[arg(long, global = true, value_enum, default_value_t = LayoutArg::Nhwc)]
    layout: LayoutArg,

    /// Panel to render; repeat for more rows. Defaults to
    /// original, sketch, original, original.
    #[arg(long = "panel", global = true, value_enum, value_name = "PANEL")]
    panels: Vec<PanelArg>,

    /// Color-dodge scale of the pencil-sketch panel.
    #[arg(long, global = true, default_value = "256", value_name = "FLOAT")]
    dodge_scale: f32,

    /// Output JPEG quality (1-100).
    #[arg(short, long, global = true, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Runtime intra-op threads, 0 for the runtime default.
    #[arg(long, global = true, default_value = "0", value_name = "INT")]
    threads: usize,

    /// Also write each panel's input and output into this directory.
    #[arg(long, global = true, value_name = "DIR")]
    save_panels: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SourceArg {
    /// Use a photo from disk.
    Gallery {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
    /// Read an encoded photo from stdin, e.g. piped from a camera tool.
    Capture,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LayoutArg {
    Nhwc,
    Nchw,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PanelArg {
    Original,
    Sketch,
}

impl From<LayoutArg> for TensorLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Nhwc => Self::Nhwc,
            LayoutArg::Nchw => Self::Nchw,
        }
    }
}

impl From<PanelArg> for Panel {
    fn from(arg: PanelArg) -> Self {
        match arg {
            PanelArg::Original => Self::Original,
            PanelArg::Sketch => Self::PencilSketch,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sketchai={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            show_alert(&Alert {
                title: "Error".to_string(),
                message: format!("{err:#}"),
            });
            ExitCode::FAILURE
        }
    }
}

/// Returns whether a sheet was produced.
fn run(args: &Args) -> Result<bool> {
    let mut config = Config {
        model_size: args.size,
        layout: args.layout.into(),
        sketch_dodge_scale: args.dodge_scale,
        output_quality: args.quality,
        model_path: args.model.clone(),
        model_dir: args.model_dir.clone(),
        model_url: args.model_url.clone(),
        threads: args.threads,
        ..Config::default()
    };
    if !args.panels.is_empty() {
        config.panels = args.panels.iter().copied().map(Panel::from).collect();
    }

    // The engine is loaded once, before any photo is read
    let mut pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    let source: ImageSource = match &args.source {
        SourceArg::Gallery { input } => {
            if !input.exists() {
                anyhow::bail!("Input file does not exist: {}", input.display());
            }
            ImageSource::Gallery(input.clone())
        }
        SourceArg::Capture => ImageSource::Capture(std::io::stdin()),
    };

    let photo = match source.acquire() {
        Ok(Some(photo)) => photo,
        Ok(None) => return Ok(false),
        Err(err) => {
            show_alert(&Alert::from_error(&err));
            return Ok(false);
        }
    };

    let result = pipeline.process(&photo).and_then(|panels| {
        if let Some(dir) = &args.save_panels {
            write_panels(dir, &panels, args.quality)?;
        }
        let pairs: Vec<_> = panels.into_iter().map(|r| (r.input, r.output)).collect();
        sketchai::image::side_by_side(&pairs, pipeline.config().gutter)
    });

    match present(result) {
        Outcome::Shown(sheet) => {
            save_image(&sheet.into(), &args.output, args.quality)
                .context("Failed to write comparison sheet")?;
            println!("Wrote {}", args.output.display());
            Ok(true)
        }
        Outcome::Alert(alert) => {
            show_alert(&alert);
            Ok(false)
        }
    }
}

fn write_panels(dir: &Path, panels: &[PanelResult], quality: u8) -> sketchai::Result<()> {
    std::fs::create_dir_all(dir)?;

    for (i, result) in panels.iter().enumerate() {
        let name = match result.panel {
            Panel::Original => "original",
            Panel::PencilSketch => "sketch",
        };
        save_image(
            &result.input.clone().into(),
            dir.join(format!("{i}_{name}_input.png")),
            quality,
        )?;
        save_image(
            &result.output.clone().into(),
            dir.join(format!("{i}_{name}_output.png")),
            quality,
        )?;
    }

    Ok(())
}

fn show_alert(alert: &Alert) {
    eprintln!("{alert}");
}
