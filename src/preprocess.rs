use std::fs;
use std::path::{Path, PathBuf};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use image::imageops::{self, FilterType};
use log::{info, warn};
use rayon::prelude::*;
use crate::{heif, load_image, MosaicError, Result};
use crate::config::bounded_pool;
use crate::source::{extension, with_suffix};

/// Largest centered square of the image.
pub fn crop_to_square(image: &DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    image.crop_imm((width - side) / 2, (height - side) / 2, side, side)
}

/// Crops to a centered square and scales it to `size` by `size`. Nearest-neighbor filtering is
/// used because tiles are small and speed matters more than quality.
pub fn preprocess_image(image: &DynamicImage, size: u32) -> RgbImage {
    let square = crop_to_square(image).to_rgb8();
    imageops::resize(&square, size, size, FilterType::Nearest)
}

/// Writes a pre-processed copy of the image at `path` to `<workdir>/<file name>.jpeg` and returns
/// the new path.
pub fn preprocess_file(path: &Path, workdir: &Path, size: u32) -> Result<PathBuf> {
    let name = path.file_name()
        .ok_or_else(|| MosaicError::unreadable(path.display(), "path has no file name"))?;
    let output = with_suffix(&workdir.join(name), ".jpeg");

    match extension(path).as_deref() {

        // tifig crops and scales HEIF images itself
        Some("heic") => heif::convert_and_resize(path, &output, size, size)?,

        Some("png" | "jpg" | "jpeg") => {
            let image = load_image(path)?;
            preprocess_image(&image, size).save_with_format(&output, ImageFormat::Jpeg)?;
        },
        _ => return Err(MosaicError::unreadable(path.display(), "unknown image format"))
    }

    Ok(output)
}

/// Turns every visible photo in `source_dir` into a square tile of one size, in parallel, with at
/// most `max_open_files` files handled at once. Files that fail are logged and left out. The
/// written paths are returned sorted.
pub fn preprocess_dir(source_dir: &Path, workdir: &Path, size: u32, max_open_files: usize) -> Result<Vec<PathBuf>> {
    if size == 0 {
        return Err(MosaicError::InvalidConfig("tile size must be positive"));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let pool = bounded_pool(max_open_files)?;
    let mut outputs: Vec<PathBuf> = pool.install(|| {
        paths.par_iter()
            .filter_map(|path| match preprocess_file(path, workdir, size) {
                Ok(output) => Some(output),
                Err(err) => {
                    warn!("error processing {}: {}", path.display(), err);
                    None
                }
            })
            .collect()
    });
    outputs.sort();

    info!("pre-processed {} of {} files in {}", outputs.len(), paths.len(), source_dir.display());
    Ok(outputs)
}
