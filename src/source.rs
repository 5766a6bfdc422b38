use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageFormat, RgbImage};
use image::io::Reader;
use log::{debug, warn};
use crate::{heif, MosaicError, Result};

// tifig only crops when the image is larger than this
const HEIF_MAX_SIZE: u32 = 10_000;

// ====================
// PUBLIC TRAITS
// ====================

/// Supplies the pixels of one candidate tile. Tiles are expected to already be square and of a
/// common size; loading may happen more than once, so implementations should not cache.
pub trait TileSource: Send + Sync {
    fn id(&self) -> String;

    fn load(&self) -> Result<RgbImage>;
}

// ====================
// PUBLIC STRUCTS
// ====================

#[derive(Clone, Debug)]
pub struct MemoryTile {
    id: String,
    image: RgbImage
}

impl MemoryTile {
    pub fn new(id: impl Into<String>, image: RgbImage) -> Self {
        MemoryTile { id: id.into(), image }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl TileSource for MemoryTile {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn load(&self) -> Result<RgbImage> {
        Ok(self.image.clone())
    }
}

/// A tile decoded from disk each time it is loaded.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileTile {
    path: PathBuf
}

impl FileTile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TileSource for FileTile {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RgbImage> {
        load_image(&self.path)
            .map(|image| image.to_rgb8())
            .map_err(|err| MosaicError::unreadable(self.path.display(), err))
    }
}

// ====================
// PUBLIC FUNCTIONS
// ====================

/// Decodes a JPEG, PNG or HEIF file, chosen by extension. HEIF files are first converted to a
/// temporary JPEG next to the source with `tifig`.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    match extension(path).as_deref() {
        Some("jpg" | "jpeg") => decode(path, ImageFormat::Jpeg),
        Some("png") => decode(path, ImageFormat::Png),
        Some("heic") => {
            let converted = with_suffix(path, ".jpeg");
            heif::convert_and_resize(path, &converted, HEIF_MAX_SIZE, HEIF_MAX_SIZE)?;

            let image = decode(&converted, ImageFormat::Jpeg);
            if let Err(err) = fs::remove_file(&converted) {
                warn!("could not remove {}: {}", converted.display(), err);
            }

            image
        },
        _ => Err(MosaicError::unreadable(path.display(), "unknown image format"))
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

fn decode(path: &Path, format: ImageFormat) -> Result<DynamicImage> {
    debug!("decoding {} as {:?}", path.display(), format);
    let mut reader = Reader::open(path)?;
    reader.set_format(format);
    Ok(reader.decode()?)
}

pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension().map(|extension| extension.to_string_lossy().to_lowercase())
}

/// Appends to the full file name, so `a.heic` becomes `a.heic.jpeg`.
pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
