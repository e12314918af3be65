use rand::Rng;

/// Row-major scalar grid evolved by 5-point Laplacian diffusion plus linear
/// decay. Border cells are frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionField {
    width: usize,
    height: usize,
    cells: Vec<f32>,
    snapshot: Vec<f32>,
}

impl Default for DiffusionField {
    fn default() -> Self {
        Self::uniform(0, 0, 0.0)
    }
}

impl DiffusionField {
    pub fn uniform(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
            snapshot: Vec::with_capacity(width * height),
        }
    }

    /// Values drawn uniformly from `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let cells = (0..width * height).map(|_| rng.gen_range(0.0..1.0)).collect();
        Self {
            width,
            height,
            cells,
            snapshot: Vec::with_capacity(width * height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = value;
        }
    }

    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    pub fn mean(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.cells.iter().sum::<f32>() / self.cells.len() as f32
    }

    /// `g' = g + D·∇²g − α·g` on interior cells, read from a copy of the
    /// previous grid. Results are clamped to `[0, 1]`.
    pub fn step(&mut self, diffusion: f32, decay: f32) {
        if self.width < 3 || self.height < 3 {
            return;
        }

        self.snapshot.clear();
        self.snapshot.extend_from_slice(&self.cells);
        let prev = &self.snapshot;
        let w = self.width;

        for y in 1..self.height - 1 {
            for x in 1..w - 1 {
                let i = y * w + x;
                let g = prev[i];
                let laplacian = prev[i + 1] + prev[i - 1] + prev[i + w] + prev[i - w] - 4.0 * g;
                self.cells[i] = (g + diffusion * laplacian - decay * g).clamp(0.0, 1.0);
            }
        }
    }
}
