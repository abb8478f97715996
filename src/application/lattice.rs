//! Generalization lattice addressed by integer node ids.
//!
//! A node assigns one level to every quasi-identifier. Ids are mixed-radix
//! numbers with the first attribute most significant, so the bottom node is
//! `0` and the top node is `size - 1`.

/// Arena view of the lattice: no node objects, only id arithmetic.
#[derive(Debug, Clone)]
pub struct Lattice {
    heights: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
    /// level sum -> node ids in ascending order
    levels: Vec<Vec<usize>>,
}

impl Lattice {
    /// Build the lattice for the given maximum level per attribute.
    #[must_use]
    pub fn new(heights: Vec<usize>) -> Self {
        let mut strides = vec![1; heights.len()];
        for position in (0..heights.len().saturating_sub(1)).rev() {
            strides[position] = strides[position + 1] * (heights[position + 1] + 1);
        }
        let size = heights.iter().map(|h| h + 1).product();
        let max_level: usize = heights.iter().sum();

        let mut lattice = Self {
            heights,
            strides,
            size,
            levels: vec![Vec::new(); max_level + 1],
        };
        for node in 0..size {
            let sum = lattice.level_sum(node);
            lattice.levels[sum].push(node);
        }
        lattice
    }

    /// Number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn heights(&self) -> &[usize] {
        &self.heights
    }

    #[must_use]
    pub fn bottom(&self) -> usize {
        0
    }

    #[must_use]
    pub fn top(&self) -> usize {
        self.size - 1
    }

    /// Number of distinct level sums.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Nodes whose levels add up to `sum`, ascending.
    #[must_use]
    pub fn level(&self, sum: usize) -> &[usize] {
        &self.levels[sum]
    }

    #[inline]
    fn digit(&self, node: usize, position: usize) -> usize {
        (node / self.strides[position]) % (self.heights[position] + 1)
    }

    /// Generalization level per attribute.
    #[must_use]
    pub fn levels_of(&self, node: usize) -> Vec<usize> {
        (0..self.heights.len()).map(|p| self.digit(node, p)).collect()
    }

    #[must_use]
    pub fn level_sum(&self, node: usize) -> usize {
        (0..self.heights.len()).map(|p| self.digit(node, p)).sum()
    }

    /// Node id of `levels`, if every level is within its hierarchy.
    #[must_use]
    pub fn node_of(&self, levels: &[usize]) -> Option<usize> {
        if levels.len() != self.heights.len() {
            return None;
        }
        levels
            .iter()
            .zip(&self.heights)
            .zip(&self.strides)
            .try_fold(0, |node, ((&level, &height), &stride)| {
                (level <= height).then_some(node + level * stride)
            })
    }

    /// Direct generalizations: one attribute raised by one level.
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.heights.len())
            .filter(move |&p| self.digit(node, p) < self.heights[p])
            .map(move |p| node + self.strides[p])
    }

    /// Direct specializations: one attribute lowered by one level.
    pub fn predecessors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.heights.len())
            .filter(move |&p| self.digit(node, p) > 0)
            .map(move |p| node - self.strides[p])
    }
}
