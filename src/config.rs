use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::{MosaicError, Result};

pub const DEFAULT_BLOCK_SIZE: u32 = 16;
pub const DEFAULT_TILE_SIZE: u32 = 50;

// Keeps the number of simultaneously open image files well under common descriptor limits
pub const DEFAULT_MAX_OPEN_FILES: usize = 32;

// ====================
// PUBLIC STRUCTS
// ====================

/// Parameters of one mosaic generation. `block_size` is the side of the square of target pixels
/// replaced by one tile, `tile_size` the side of each tile in the output, and `max_open_files` the
/// number of workers allowed to read tile images at the same time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MosaicConfig {
    pub block_size: u32,
    pub tile_size: u32,
    pub max_open_files: usize
}

impl Default for MosaicConfig {
    fn default() -> Self {
        MosaicConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            tile_size: DEFAULT_TILE_SIZE,
            max_open_files: DEFAULT_MAX_OPEN_FILES
        }
    }
}

impl MosaicConfig {
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_max_open_files(mut self, max_open_files: usize) -> Self {
        self.max_open_files = max_open_files;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(MosaicError::InvalidConfig("block size must be positive"));
        } else if self.tile_size == 0 {
            return Err(MosaicError::InvalidConfig("tile size must be positive"));
        } else if self.max_open_files == 0 {
            return Err(MosaicError::InvalidConfig("at least one file must be allowed open"));
        }

        Ok(())
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

/// Pool for work that opens files. Its size caps how many files are open at once.
pub(crate) fn bounded_pool(max_open_files: usize) -> Result<ThreadPool> {
    if max_open_files == 0 {
        return Err(MosaicError::InvalidConfig("at least one file must be allowed open"));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(max_open_files)
        .thread_name(|index| format!("mosaic-io-{index}"))
        .build()?;

    Ok(pool)
}
