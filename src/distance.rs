use kd_tree::{KdPoint, KdTree};
use crate::{Color, Palette};

// ====================
// PUBLIC STRUCTS
// ====================

/// A balanced k-d tree built in one pass from a complete set of colors. Answers the same
/// squared-distance query as [`crate::ColorIndex`], but which of several equally close colors it
/// returns depends on the balancing rather than on insertion order.
pub struct BulkColorIndex {
    tree: Option<KdTree<ColorKdPoint>>
}

impl BulkColorIndex {
    pub fn new(colors: &[Color]) -> Self {
        if colors.is_empty() {
            return BulkColorIndex { tree: None };
        }

        let points = colors.iter().map(|&color| ColorKdPoint(color)).collect();
        BulkColorIndex { tree: Some(KdTree::build(points)) }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_none()
    }
}

impl Palette for BulkColorIndex {
    fn nearest(&self, color: Color) -> Option<Color> {
        let components = [color.red, color.green, color.blue].map(i32::from);
        self.tree.as_ref()
            .and_then(|tree| tree.nearest(&components))
            .map(|result| result.item.0)
    }
}

// ====================
// PRIVATE STRUCTS
// ====================

struct ColorKdPoint(Color);

impl KdPoint for ColorKdPoint {

    // Use i32 to allow for subtraction and squaring without overflow
    type Scalar = i32;
    type Dim = typenum::U3;

    fn at(&self, i: usize) -> Self::Scalar {
        self.0.channel(i) as i32
    }
}
