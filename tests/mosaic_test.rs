use image::{ImageFormat, Rgb, RgbImage};
use photo_mosaic_rs::{generate, pixelate, Color, ColorIndex, FileTile, MemoryTile, MosaicAssembler, MosaicConfig,
                      MosaicError, Palette, PaletteBuilder};

fn solid_tile(id: &str, size: u32, color: [u8; 3]) -> MemoryTile {
    MemoryTile::new(id, RgbImage::from_pixel(size, size, Rgb(color)))
}

fn quadrant_target() -> RgbImage {

    // Four 8x8 quadrants: red, green / blue, white
    RgbImage::from_fn(16, 16, |x, y| match (x < 8, y < 8) {
        (true, true) => Rgb([250, 5, 5]),
        (false, true) => Rgb([5, 250, 5]),
        (true, false) => Rgb([5, 5, 250]),
        (false, false) => Rgb([250, 250, 250])
    })
}

fn primary_tiles() -> Vec<MemoryTile> {
    vec![
        solid_tile("red", 4, [255, 0, 0]),
        solid_tile("green", 4, [0, 255, 0]),
        solid_tile("blue", 4, [0, 0, 255]),
        solid_tile("white", 4, [255, 255, 255])
    ]
}

#[test]
fn quadrants_are_rebuilt_from_matching_tiles() {
    let config = MosaicConfig::default().with_block_size(8).with_tile_size(5).with_max_open_files(2);
    let mosaic = generate(&quadrant_target(), primary_tiles(), &config).unwrap();

    assert_eq!((10, 10), mosaic.dimensions());
    assert_eq!(Rgb([255, 0, 0]), *mosaic.get_pixel(2, 2));
    assert_eq!(Rgb([0, 255, 0]), *mosaic.get_pixel(7, 2));
    assert_eq!(Rgb([0, 0, 255]), *mosaic.get_pixel(2, 7));
    assert_eq!(Rgb([255, 255, 255]), *mosaic.get_pixel(9, 9));
}

#[test]
fn partial_blocks_still_get_tiles() {
    let target = RgbImage::from_pixel(10, 7, Rgb([250, 5, 5]));
    let config = MosaicConfig::default().with_block_size(4).with_tile_size(3).with_max_open_files(1);
    let mosaic = generate(&target, primary_tiles(), &config).unwrap();

    // ceil(10 / 4) by ceil(7 / 4) cells
    assert_eq!((9, 6), mosaic.dimensions());
    assert!(mosaic.pixels().all(|&pixel| pixel == Rgb([255, 0, 0])));
}

#[test]
fn generation_is_repeatable() {
    let config = MosaicConfig::default().with_block_size(3).with_tile_size(2).with_max_open_files(3);
    let first = generate(&quadrant_target(), primary_tiles(), &config).unwrap();
    let second = generate(&quadrant_target(), primary_tiles(), &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_usable_tiles_is_an_empty_palette() {
    let config = MosaicConfig::default().with_block_size(8).with_tile_size(4);
    let tiles = vec![MemoryTile::new("wide", RgbImage::new(6, 3))];
    assert!(matches!(generate(&quadrant_target(), tiles, &config), Err(MosaicError::EmptyPalette)));
}

#[test]
fn tiles_on_disk_are_placed() {
    let dir = std::env::temp_dir().join(format!("photo_mosaic_integration_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let mut sources = Vec::new();
    for (name, color) in [("red.png", [255, 0, 0]), ("blue.png", [0, 0, 255])] {
        let path = dir.join(name);
        RgbImage::from_pixel(4, 4, Rgb(color)).save_with_format(&path, ImageFormat::Png).unwrap();
        sources.push(FileTile::new(path));
    }

    let palette = PaletteBuilder::new(2).build(sources).unwrap();
    let grid = pixelate(&quadrant_target(), 8).unwrap();
    let mosaic = MosaicAssembler::new(4, 2).assemble(&grid, palette.index(), palette.tiles()).unwrap();

    assert_eq!((8, 8), mosaic.dimensions());
    assert_eq!(Rgb([255, 0, 0]), *mosaic.get_pixel(1, 1));
    assert_eq!(Rgb([0, 0, 255]), *mosaic.get_pixel(1, 6));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn index_matches_brute_force_over_palette() {
    let colors: Vec<Color> = (0..=255u8).step_by(17)
        .flat_map(|red| (0..=255u8).step_by(51).map(move |green| Color::new(red, green, 255 - red)))
        .collect();
    let index: ColorIndex = colors.iter().copied().collect();

    for query in [Color::new(3, 200, 77), Color::new(128, 128, 128), Color::new(255, 0, 255)] {
        let expected = colors.iter().map(|color| color.distance_squared(query)).min();
        let found = index.nearest(query).map(|color| color.distance_squared(query));
        assert_eq!(expected, found);
    }
}
