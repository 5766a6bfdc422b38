use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Instant;
use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{debug, info};
use rayon::prelude::*;
use crate::{pixelate, Color, Image, MosaicConfig, MosaicError, Palette, PaletteBuilder, PixelGrid, Result, Tile, TileSource};
use crate::config::bounded_pool;

const CHANNELS: usize = 3;

// ====================
// PUBLIC STRUCTS
// ====================

/// Places the closest tile for every cell of a pixelated image into the output raster.
#[derive(Clone, Copy, Debug)]
pub struct MosaicAssembler {
    tile_size: u32,
    max_open_files: usize
}

impl MosaicAssembler {
    pub fn new(tile_size: u32, max_open_files: usize) -> Self {
        MosaicAssembler { tile_size, max_open_files }
    }

    pub fn from_config(config: &MosaicConfig) -> Self {
        MosaicAssembler::new(config.tile_size, config.max_open_files)
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Builds a raster of `grid.width() * tile_size` by `grid.height() * tile_size` pixels. Each
    /// distinct tile is loaded once, however many cells use it. Fails with
    /// [`MosaicError::EmptyPalette`] when there are no tiles; never returns a partly filled raster.
    pub fn assemble<P, S>(&self, grid: &PixelGrid, index: &P, tiles: &HashMap<Color, Tile<S>>) -> Result<RgbImage>
    where P: Palette, S: TileSource {
        if self.tile_size == 0 {
            return Err(MosaicError::InvalidConfig("tile size must be positive"));
        } else if tiles.is_empty() {
            return Err(MosaicError::EmptyPalette);
        }

        let groups = group_cells(grid, index, tiles)?;
        debug!("{} cells use {} distinct tiles", grid.colors().len(), groups.len());

        let (width, height) = raster_dimensions(grid, self.tile_size)?;
        let mut raster = RgbImage::new(width, height);
        let mut regions = split_regions(&mut raster, grid.width(), self.tile_size);

        let jobs: Vec<(&Tile<S>, Vec<Region>)> = groups.into_iter()
            .map(|(tile, cells)| {
                let owned = cells.into_iter().filter_map(|cell| regions[cell].take()).collect();
                (tile, owned)
            })
            .collect();

        // Every job writes only the regions it owns; install returns once all of them finish
        let pool = bounded_pool(self.max_open_files)?;
        pool.install(|| {
            jobs.into_par_iter().try_for_each(|(tile, regions)| self.composite(tile, regions))
        })?;

        Ok(raster)
    }

    fn composite<S: TileSource>(&self, tile: &Tile<S>, regions: Vec<Region>) -> Result<()> {
        let image = self.fit(tile.source().load()?);
        debug!("placing tile {} in {} cells", tile.id(), regions.len());

        for region in regions {
            region.fill(&image);
        }

        Ok(())
    }

    /// Stored tiles may come from a run with another tile size.
    fn fit(&self, image: RgbImage) -> RgbImage {
        if image.dimensions() == (self.tile_size, self.tile_size) {
            image
        } else {
            imageops::resize(&image, self.tile_size, self.tile_size, FilterType::Nearest)
        }
    }
}

// ====================
// PUBLIC FUNCTIONS
// ====================

/// Runs the whole pipeline: indexes the tiles, pixelates the target and assembles the mosaic.
pub fn generate<I, S>(target: I, sources: Vec<S>, config: &MosaicConfig) -> Result<RgbImage>
where I: Image + Sync, S: TileSource {
    config.validate()?;
    let start = Instant::now();

    let palette = PaletteBuilder::new(config.max_open_files).build(sources)?;
    info!("built palette of {} tiles: {:?}", palette.len(), start.elapsed());

    let grid = pixelate(target, config.block_size)?;
    info!("pixelated to {}x{} cells: {:?}", grid.width(), grid.height(), start.elapsed());

    let raster = MosaicAssembler::from_config(config).assemble(&grid, palette.index(), palette.tiles())?;
    info!("generated mosaic: {:?}", start.elapsed());

    Ok(raster)
}

// ====================
// PRIVATE STRUCTS
// ====================

/// Exclusive access to the rows of one cell of the raster.
struct Region<'a> {
    rows: Vec<&'a mut [u8]>
}

impl Region<'_> {
    fn fill(self, tile: &RgbImage) {
        let span = tile.width() as usize * CHANNELS;
        for (row, pixels) in self.rows.into_iter().zip(tile.as_raw().chunks_exact(span)) {
            row.copy_from_slice(pixels);
        }
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

/// Groups cell indices by the tile matched to them, in order of first use.
fn group_cells<'t, P, S>(grid: &PixelGrid, index: &P, tiles: &'t HashMap<Color, Tile<S>>) -> Result<Vec<(&'t Tile<S>, Vec<usize>)>>
where P: Palette {
    let mut slots: HashMap<Color, usize> = HashMap::new();
    let mut groups: Vec<(&Tile<S>, Vec<usize>)> = Vec::new();

    for (cell, &color) in grid.colors().iter().enumerate() {
        let nearest = index.nearest(color).ok_or(MosaicError::EmptyPalette)?;

        let slot = match slots.entry(nearest) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let tile = tiles.get(&nearest)
                    .ok_or_else(|| MosaicError::unreadable(format!("{nearest:?}"), "no tile has this color"))?;
                groups.push((tile, Vec::new()));
                *entry.insert(groups.len() - 1)
            }
        };

        groups[slot].1.push(cell);
    }

    Ok(groups)
}

/// Output size in pixels, checked so the raster buffer can actually be allocated.
fn raster_dimensions(grid: &PixelGrid, tile_size: u32) -> Result<(u32, u32)> {
    let width = grid.width().checked_mul(tile_size);
    let height = grid.height().checked_mul(tile_size);

    let bytes = width.zip(height).and_then(|(width, height)| {
        (width as usize).checked_mul(height as usize)?.checked_mul(CHANNELS)
    });

    match (width, height, bytes) {
        (Some(width), Some(height), Some(_)) => Ok((width, height)),
        _ => Err(MosaicError::InvalidConfig("mosaic is too large for one image"))
    }
}

/// Splits the raster into one region per cell, indexed like the grid's cells.
fn split_regions(raster: &mut RgbImage, grid_width: u32, tile_size: u32) -> Vec<Option<Region<'_>>> {
    let columns = grid_width as usize;
    let tile_size = tile_size as usize;
    let span = tile_size * CHANNELS;
    let mut regions: Vec<Option<Region>> = Vec::new();

    if columns == 0 || span == 0 {
        return regions;
    }

    for (y, row) in raster.chunks_exact_mut(columns * span).enumerate() {
        let cell_row = y / tile_size;
        if y % tile_size == 0 {
            regions.extend((0..columns).map(|_| Some(Region { rows: Vec::with_capacity(tile_size) })));
        }

        for (column, pixels) in row.chunks_exact_mut(span).enumerate() {
            if let Some(region) = regions[cell_row * columns + column].as_mut() {
                region.rows.push(pixels);
            }
        }
    }

    regions
}
