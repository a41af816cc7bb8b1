/// Bit-packed cell occupancy grid.
///
/// One bit per grid cell, row-major, grouped into `u32` words: a row of a
/// 32-wide grid is exactly one word, wider grids span `width / 32`
/// consecutive words per row. A set bit means the cell holds a particle; no
/// color or other payload is stored, which keeps collision checks a single
/// mask test.
#[derive(Debug, Clone)]
pub struct OccupancyBitmap {
    width: i32,
    height: i32,
    words: Vec<u32>,
}

impl OccupancyBitmap {
    /// Create an empty bitmap for a `width` x `height` cell grid.
    ///
    /// Both dimensions must be positive multiples of 32; the engine validates
    /// them before construction, so here they are only asserted.
    pub(crate) fn new(width: i32, height: i32) -> Self {
        assert!(
            width > 0 && width % 32 == 0 && height > 0 && height % 32 == 0,
            "bitmap dimensions {width}x{height} must be positive multiples of 32"
        );
        Self {
            width,
            height,
            words: vec![0; (height * (width / 32)) as usize],
        }
    }

    /// Grid width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether the cell at `(cell_x, cell_y)` is occupied.
    ///
    /// Panics if the coordinates lie outside the grid; staying in bounds is
    /// the caller's invariant, not a recoverable condition.
    #[inline]
    pub fn get(&self, cell_x: i32, cell_y: i32) -> bool {
        let (word, bit) = self.locate(cell_x, cell_y);
        self.words[word] & (1 << bit) != 0
    }

    /// Mark the cell at `(cell_x, cell_y)` occupied.
    #[inline]
    pub(crate) fn set(&mut self, cell_x: i32, cell_y: i32) {
        let (word, bit) = self.locate(cell_x, cell_y);
        self.words[word] |= 1 << bit;
    }

    /// Mark the cell at `(cell_x, cell_y)` vacant.
    #[inline]
    pub(crate) fn clear(&mut self, cell_x: i32, cell_y: i32) {
        let (word, bit) = self.locate(cell_x, cell_y);
        self.words[word] &= !(1 << bit);
    }

    /// Word index and bit offset of a cell. The row stride is `width / 32`
    /// words, so the addressing holds for any valid width, not just 32.
    #[inline]
    fn locate(&self, cell_x: i32, cell_y: i32) -> (usize, u32) {
        assert!(
            cell_x >= 0 && cell_x < self.width && cell_y >= 0 && cell_y < self.height,
            "cell ({cell_x}, {cell_y}) outside {}x{} grid",
            self.width,
            self.height
        );
        let word = cell_y * (self.width / 32) + cell_x / 32;
        (word as usize, (cell_x % 32) as u32)
    }
}
