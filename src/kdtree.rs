use crate::{component_distance_squared, Color, Palette};

// ====================
// PUBLIC STRUCTS
// ====================

/// A k-d tree over RGB colors that is built one color at a time. The tree is never rebalanced,
/// so its shape, and which of several equally close colors a query returns, depend only on the
/// order of insertion.
#[derive(Clone, Debug, Default)]
pub struct ColorIndex {
    root: Option<Box<Node>>,
    len: usize
}

impl ColorIndex {
    pub fn new() -> Self {
        ColorIndex::default()
    }

    pub fn insert(&mut self, color: Color) {
        let mut slot = &mut self.root;
        let mut axis = 0;

        // Equal channel values go to the low side
        while let Some(node) = slot {
            slot = if color.channel(axis) > node.color.channel(axis) {
                &mut node.high
            } else {
                &mut node.low
            };
            axis = next_axis(axis);
        }

        *slot = Some(Box::new(Node::new(color)));
        self.len += 1;
    }

    pub fn nearest_with_distance(&self, target: Color) -> Option<(Color, u32)> {
        self.root.as_ref().map(|root| root.nearest(target, 0))
    }

    /// Number of stored colors, counting duplicates.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

impl Palette for ColorIndex {
    fn nearest(&self, color: Color) -> Option<Color> {
        self.nearest_with_distance(color).map(|(nearest, _)| nearest)
    }
}

impl FromIterator<Color> for ColorIndex {
    fn from_iter<T: IntoIterator<Item=Color>>(colors: T) -> Self {
        let mut index = ColorIndex::new();
        colors.into_iter().for_each(|color| index.insert(color));
        index
    }
}

// ====================
// PRIVATE STRUCTS
// ====================

#[derive(Clone, Debug)]
struct Node {
    color: Color,
    low: Option<Box<Node>>,
    high: Option<Box<Node>>
}

impl Node {
    fn new(color: Color) -> Self {
        Node { color, low: None, high: None }
    }

    fn nearest(&self, target: Color, axis: usize) -> (Color, u32) {
        let distance = self.color.distance_squared(target);
        if distance == 0 {
            return (self.color, 0);
        }

        let (near, far) = if target.channel(axis) > self.color.channel(axis) {
            (&self.high, &self.low)
        } else {
            (&self.low, &self.high)
        };

        let mut best = near.as_ref().map(|child| child.nearest(target, next_axis(axis)));

        /* The far side can only hold a closer color if the splitting plane itself is closer
           than the best color found so far. */
        let plane_distance = component_distance_squared(target.channel(axis), self.color.channel(axis));
        let search_far = best.map_or(true, |(_, best_distance)| plane_distance < best_distance);

        if search_far {
            if let Some(candidate) = far.as_ref().map(|child| child.nearest(target, next_axis(axis))) {
                if best.map_or(true, |(_, best_distance)| candidate.1 < best_distance) {
                    best = Some(candidate);
                }
            }
        }

        // This node replaces the subtree result only if strictly closer
        match best {
            Some((color, best_distance)) if best_distance <= distance => (color, best_distance),
            _ => (self.color, distance)
        }
    }
}

// ====================
// PRIVATE FUNCTIONS
// ====================

fn next_axis(axis: usize) -> usize {
    (axis + 1) % 3
}
