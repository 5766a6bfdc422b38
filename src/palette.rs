use std::collections::HashMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use crate::{average_color, Color, ColorIndex, MosaicError, Palette, Result, TileSource};
use crate::config::{bounded_pool, DEFAULT_MAX_OPEN_FILES};

#[cfg(feature = "distance")]
use crate::BulkColorIndex;

// ====================
// PUBLIC STRUCTS
// ====================

/// A candidate tile and the average color of its pixels.
#[derive(Clone, Debug)]
pub struct Tile<S> {
    source: S,
    color: Color
}

impl<S: TileSource> Tile<S> {
    pub fn new(source: S, color: Color) -> Self {
        Tile { source, color }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn id(&self) -> String {
        self.source.id()
    }
}

/// Tiles indexed by average color. Every inserted color stays in the index, but only the last
/// tile inserted for a given color can be matched.
pub struct TilePalette<S> {
    index: ColorIndex,
    tiles: HashMap<Color, Tile<S>>
}

impl<S: TileSource> TilePalette<S> {
    pub fn new() -> Self {
        TilePalette { index: ColorIndex::new(), tiles: HashMap::new() }
    }

    pub fn insert(&mut self, tile: Tile<S>) {
        let color = tile.color();
        self.index.insert(color);

        if let Some(replaced) = self.tiles.insert(color, tile) {
            debug!("tile {} shares color {:?} and is no longer reachable", replaced.id(), color);
        }
    }

    pub fn index(&self) -> &ColorIndex {
        &self.index
    }

    pub fn tiles(&self) -> &HashMap<Color, Tile<S>> {
        &self.tiles
    }

    /// Number of tiles that can be matched.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Number of colors in the index, including those of replaced tiles.
    pub fn indexed(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn nearest_tile(&self, color: Color) -> Option<&Tile<S>> {
        self.index.nearest(color).and_then(|nearest| self.tiles.get(&nearest))
    }

    /// A balanced index over the colors of the matchable tiles.
    #[cfg(feature = "distance")]
    pub fn bulk_index(&self) -> BulkColorIndex {
        let mut colors: Vec<Color> = self.tiles.keys().copied().collect();

        // Map order varies between runs; sorting keeps the built tree the same
        colors.sort();
        BulkColorIndex::new(&colors)
    }
}

impl<S: TileSource> Default for TilePalette<S> {
    fn default() -> Self {
        TilePalette::new()
    }
}

/// Loads and averages tile images in parallel, then indexes them from a single thread.
#[derive(Clone, Copy, Debug)]
pub struct PaletteBuilder {
    max_open_files: usize
}

impl Default for PaletteBuilder {
    fn default() -> Self {
        PaletteBuilder::new(DEFAULT_MAX_OPEN_FILES)
    }
}

impl PaletteBuilder {
    pub fn new(max_open_files: usize) -> Self {
        PaletteBuilder { max_open_files }
    }

    /// Tiles that cannot be loaded or are not square are logged and skipped, so the result may
    /// be empty. Tiles are indexed in the order of `sources` whatever order they load in.
    pub fn build<S: TileSource>(&self, sources: Vec<S>) -> Result<TilePalette<S>> {
        let candidates = sources.len();
        let pool = bounded_pool(self.max_open_files)?;

        let loaded: Vec<Option<Tile<S>>> = pool.install(|| {
            sources.into_par_iter()
                .map(|source| match tile_color(&source) {
                    Ok(color) => Some(Tile::new(source, color)),
                    Err(err) => {
                        warn!("skipping tile {}: {}", source.id(), err);
                        None
                    }
                })
                .collect()
        });

        let mut palette = TilePalette::new();
        loaded.into_iter().flatten().for_each(|tile| palette.insert(tile));

        info!("indexed {} of {} candidate tiles", palette.indexed(), candidates);
        Ok(palette)
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

fn tile_color<S: TileSource>(source: &S) -> Result<Color> {
    let image = source.load()?;

    let (width, height) = image.dimensions();
    if width != height || width == 0 {
        return Err(MosaicError::DimensionMismatch { id: source.id(), width, height });
    }

    average_color(&image).ok_or_else(|| MosaicError::unreadable(source.id(), "tile has no pixels"))
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use crate::{Color, MemoryTile, Palette, PaletteBuilder, Tile, TilePalette, TileSource};
    use crate::tests::{solid_tile, FailingTile, BLUE, GREEN, RED};

    enum MixedTile {
        Good(MemoryTile),
        Bad(&'static str)
    }

    impl TileSource for MixedTile {
        fn id(&self) -> String {
            match self {
                MixedTile::Good(tile) => tile.id(),
                MixedTile::Bad(id) => FailingTile(*id).id()
            }
        }

        fn load(&self) -> crate::Result<RgbImage> {
            match self {
                MixedTile::Good(tile) => tile.load(),
                MixedTile::Bad(id) => FailingTile(*id).load()
            }
        }
    }

    #[test]
    fn test_builds_index_and_mapping() {
        let palette = PaletteBuilder::new(4)
            .build(vec![solid_tile("red", 4, RED), solid_tile("blue", 4, BLUE)])
            .unwrap();

        assert_eq!(2, palette.len());
        assert_eq!(2, palette.indexed());
        assert_eq!(Some(RED), palette.index().nearest(Color::new(200, 10, 10)));
        assert_eq!("red", palette.tiles()[&RED].id());
        assert_eq!("blue", palette.nearest_tile(Color::new(0, 0, 90)).unwrap().id());
    }

    #[test]
    fn test_tile_color_is_whole_image_average() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        image.put_pixel(0, 0, Rgb([200, 100, 41]));

        let palette = PaletteBuilder::new(1).build(vec![MemoryTile::new("mixed", image)]).unwrap();
        let tile = palette.nearest_tile(Color::default()).unwrap();
        assert_eq!(Color::new(50, 25, 10), tile.color());
    }

    #[test]
    fn test_unreadable_tiles_are_skipped() {
        let sources = vec![
            MixedTile::Bad("corrupt"),
            MixedTile::Good(solid_tile("green", 3, GREEN)),
            MixedTile::Bad("missing")
        ];

        let palette = PaletteBuilder::new(2).build(sources).unwrap();
        assert_eq!(1, palette.len());
        assert_eq!("green", palette.nearest_tile(RED).unwrap().id());
    }

    #[test]
    fn test_mis_sized_tiles_are_skipped() {
        let sources = vec![
            MemoryTile::new("wide", RgbImage::new(4, 2)),
            MemoryTile::new("empty", RgbImage::new(0, 0)),
            solid_tile("red", 5, RED)
        ];

        let palette = PaletteBuilder::new(2).build(sources).unwrap();
        assert_eq!(1, palette.len());
        assert!(palette.tiles().contains_key(&RED));
    }

    #[test]
    fn test_no_usable_tiles_gives_empty_palette() {
        let palette = PaletteBuilder::default().build(vec![FailingTile("a"), FailingTile("b")]).unwrap();
        assert!(palette.is_empty());
        assert!(palette.index().is_empty());
        assert!(palette.nearest_tile(RED).is_none());

        let palette = PaletteBuilder::default().build(Vec::<MemoryTile>::new()).unwrap();
        assert!(palette.is_empty());
    }

    #[test]
    fn test_same_color_keeps_last_tile() {
        let palette = PaletteBuilder::new(8)
            .build(vec![solid_tile("first", 4, BLUE), solid_tile("second", 4, BLUE)])
            .unwrap();

        assert_eq!(1, palette.len());
        assert_eq!(2, palette.indexed());
        assert_eq!("second", palette.nearest_tile(BLUE).unwrap().id());
    }

    #[test]
    fn test_insertion_follows_source_order() {
        let sources: Vec<MemoryTile> = (0..64u8)
            .map(|value| solid_tile(&format!("tile{value}"), 2, Color::new(value * 4, 255 - value, value)))
            .collect();

        let mut expected = TilePalette::new();
        for source in sources.clone() {
            let color = source.image().get_pixel(0, 0).0.into();
            expected.insert(Tile::new(source, color));
        }

        let built = PaletteBuilder::new(8).build(sources).unwrap();
        for value in 0..=255u8 {
            let query = Color::new(value, value / 2, 255 - value);
            assert_eq!(expected.index().nearest_with_distance(query), built.index().nearest_with_distance(query));
        }
    }

    #[cfg(feature = "distance")]
    #[test]
    fn test_bulk_index_covers_matchable_tiles() {
        let palette = PaletteBuilder::new(2)
            .build(vec![solid_tile("red", 2, RED), solid_tile("green", 2, GREEN), solid_tile("blue", 2, BLUE)])
            .unwrap();

        let bulk = palette.bulk_index();
        for &color in &[RED, GREEN, BLUE] {
            assert_eq!(Some(color), bulk.nearest(color));
        }
    }
}
