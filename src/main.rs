use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use anyhow::{Context, Result};
use clap::{Parser, ValueHint};
use image::ImageFormat;
use log::{info, warn};
use photo_mosaic_rs::preprocess::preprocess_dir;
use photo_mosaic_rs::{load_image, pixelate, FileTile, MosaicAssembler, MosaicConfig, PaletteBuilder,
                      DEFAULT_BLOCK_SIZE, DEFAULT_MAX_OPEN_FILES, DEFAULT_TILE_SIZE};

#[derive(Parser, Debug)]
#[command(name = "photo-mosaic", version, about = "Rebuild an image out of a directory of photos")]
struct Cli {
    /// Directory of candidate tile photos (JPEG, PNG or HEIC)
    #[arg(value_hint = ValueHint::DirPath)]
    tile_dir: PathBuf,

    /// Image to rebuild
    #[arg(value_hint = ValueHint::FilePath)]
    target: PathBuf,

    /// Side of the square of target pixels replaced by one tile
    #[arg(long = "block-size", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: u32,

    /// Side of each tile in the output, in pixels
    #[arg(long = "tile-size", default_value_t = DEFAULT_TILE_SIZE)]
    tile_size: u32,

    /// Most image files read at the same time
    #[arg(long = "max-open-files", default_value_t = DEFAULT_MAX_OPEN_FILES)]
    max_open_files: usize,

    /// Where the mosaic is written, always as JPEG
    #[arg(short, long, default_value = "mosaic.jpeg", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Also write the pixelated target, one pixel per tile
    #[arg(long, value_hint = ValueHint::FilePath)]
    pixelated: Option<PathBuf>
}

/// Temporary directory for pre-processed tiles, removed when dropped.
struct WorkDir {
    path: PathBuf
}

impl WorkDir {
    fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("mosaic_{}", std::process::id()));
        fs::create_dir_all(&path).with_context(|| format!("creating {}", path.display()))?;
        Ok(WorkDir { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.path) {
            warn!("could not remove {}: {}", self.path.display(), err);
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = MosaicConfig::default()
        .with_block_size(cli.block_size)
        .with_tile_size(cli.tile_size)
        .with_max_open_files(cli.max_open_files);
    config.validate()?;

    let start = Instant::now();
    let workdir = WorkDir::create()?;
    let tiles = preprocess_dir(&cli.tile_dir, workdir.path(), config.tile_size, config.max_open_files)
        .with_context(|| format!("pre-processing {}", cli.tile_dir.display()))?;
    info!("pre-processed {} tiles: {:?}", tiles.len(), start.elapsed());

    let target = load_image(&cli.target)
        .with_context(|| format!("loading target {}", cli.target.display()))?
        .to_rgb8();

    let sources: Vec<FileTile> = tiles.into_iter().map(FileTile::new).collect();
    let palette = PaletteBuilder::new(config.max_open_files).build(sources)?;
    info!("built palette of {} tiles: {:?}", palette.len(), start.elapsed());

    let grid = pixelate(&target, config.block_size)?;
    info!("pixelated to {}x{} cells: {:?}", grid.width(), grid.height(), start.elapsed());

    if let Some(path) = &cli.pixelated {
        grid.to_image()
            .save(path)
            .with_context(|| format!("saving pixelated image to {}", path.display()))?;
    }

    let mosaic = MosaicAssembler::from_config(&config)
        .assemble(&grid, palette.index(), palette.tiles())
        .context("assembling mosaic")?;
    mosaic.save_with_format(&cli.output, ImageFormat::Jpeg)
        .with_context(|| format!("saving mosaic to {}", cli.output.display()))?;

    info!("wrote {}: {:?}", cli.output.display(), start.elapsed());
    Ok(())
}
