//! Locating, downloading, and loading the bundled model artifact.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use ort::session::Session;

use crate::error::{Error, Result};

/// File name of the model for a given input side, e.g. `model_256.onnx`.
#[must_use]
pub fn model_filename(size: u32) -> String {
    format!("model_{size}.onnx")
}

/// Where the model artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// A file given explicitly.
    Path(PathBuf),
    /// A file in the model directory, fetched from `url` when missing.
    Cached {
        filename: String,
        url: Option<String>,
    },
}

/// Manages the directory holding model artifacts.
pub struct ModelStore {
    model_dir: PathBuf,
}

impl ModelStore {
    /// Create a store rooted at the platform cache directory:
    /// - Windows: `%LOCALAPPDATA%\sketchai\models`
    /// - Linux: `~/.cache/sketchai/models`
    /// - macOS: `~/Library/Caches/sketchai/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join("sketchai").join("models"))
    }

    /// Create a store rooted at `model_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn at(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();

        fs::create_dir_all(&model_dir).map_err(|source| Error::CacheDir {
            path: model_dir.clone(),
            source,
        })?;

        Ok(Self { model_dir })
    }

    /// Directory the store reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.model_dir
    }

    /// Resolve `source` to a file on disk, downloading if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist and cannot be fetched.
    pub fn resolve(&self, source: &ModelSource) -> Result<PathBuf> {
        match source {
            ModelSource::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(Error::ModelNotFound {
                        name: path.display().to_string(),
                        searched: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    })
                }
            }
            ModelSource::Cached { filename, url } => {
                let path = self.model_dir.join(filename);
                if path.is_file() {
                    return Ok(path);
                }

                match url {
                    Some(url) => {
                        download_file(url, &path, filename)?;
                        Ok(path)
                    }
                    None => Err(Error::ModelNotFound {
                        name: filename.clone(),
                        searched: self.model_dir.clone(),
                    }),
                }
            }
        }
    }
}

/// Build an ONNX Runtime session from a model file.
///
/// `threads` of 0 leaves the runtime default.
///
/// # Errors
///
/// Returns an error if the model cannot be loaded.
pub fn load_session(path: &Path, threads: usize) -> Result<Session> {
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let model_load = |source| Error::ModelLoad {
        name: name.clone(),
        source,
    };

    let mut builder = Session::builder().map_err(model_load)?;
    if threads > 0 {
        builder = builder.with_intra_threads(threads).map_err(model_load)?;
    }

    tracing::info!("Loading model {}", path.display());
    builder.commit_from_file(path).map_err(model_load)
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path, name: &str) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| Error::ModelDownload {
            name: name.to_string(),
            source,
        })?;

    let pb = match response.content_length() {
        Some(total) => {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        }
        None => ProgressBar::new_spinner(),
    };
    pb.set_message(format!("Downloading {name}"));

    store_atomically(response, path, &pb)?;
    pb.finish_with_message(format!("Downloaded {name}"));

    Ok(())
}

/// Stream `reader` into a temporary file next to `path`, then rename it into
/// place. The temporary file is removed if the copy fails.
fn store_atomically<R: Read>(reader: R, path: &Path, pb: &ProgressBar) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let copied = copy_with_progress(reader, &temp_path, pb);
    if let Err(err) = copied {
        pb.abandon();
        if let Err(cleanup) = fs::remove_file(&temp_path) {
            tracing::warn!("Could not remove {}: {cleanup}", temp_path.display());
        }
        return Err(err);
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

fn copy_with_progress<R: Read>(mut reader: R, temp_path: &Path, pb: &ProgressBar) -> Result<()> {
    let mut file = fs::File::create(temp_path)?;
    let mut downloaded = 0u64;

    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;

    Ok(())
}
