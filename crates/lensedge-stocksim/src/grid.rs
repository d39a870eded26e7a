//! Dense voxel grids for blank and death-time fields.

use serde::{Deserialize, Serialize};

use crate::{StockSimError, StockSimResult};

/// Scalar value of an uncut material cell.
pub const MATERIAL: f32 = 1000.0;

/// Scalar value of an air cell.
pub const AIR: f32 = 0.0;

/// A dense 3-D scalar field over a box-shaped region.
///
/// Scalars are stored flat with the X index varying fastest, then Y,
/// then Z, matching what the volume renderer consumes. Spacing is
/// uniform along all three axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeGrid {
    dimensions: [usize; 3],
    spacing: f64,
    origin: [f64; 3],
    scalars: Vec<f32>,
}

/// A grid of normalized death frames (0-1000).
///
/// Same shape and encoding as the blank it was derived from: air cells
/// stay at [`AIR`], cells never reached by a wheel keep [`MATERIAL`],
/// and cut cells hold the normalized frame at which they were removed.
pub type DeathTimeGrid = VolumeGrid;

impl VolumeGrid {
    /// Create a grid filled with a constant scalar.
    pub fn new(dimensions: [usize; 3], spacing: f64, origin: [f64; 3], fill: f32) -> Self {
        let len = dimensions[0] * dimensions[1] * dimensions[2];
        Self {
            dimensions,
            spacing,
            origin,
            scalars: vec![fill; len],
        }
    }

    /// Create a grid from an existing scalar buffer.
    pub fn with_scalars(
        dimensions: [usize; 3],
        spacing: f64,
        origin: [f64; 3],
        scalars: Vec<f32>,
    ) -> StockSimResult<Self> {
        let expected = dimensions[0] * dimensions[1] * dimensions[2];
        if scalars.len() != expected {
            return Err(StockSimError::GridMismatch {
                expected,
                got: scalars.len(),
            });
        }
        Ok(Self {
            dimensions,
            spacing,
            origin,
            scalars,
        })
    }

    /// Cell counts along X, Y, Z.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Uniform cell size (mm).
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Per-axis spacing, as the renderer export expects it.
    pub fn spacing_xyz(&self) -> [f64; 3] {
        [self.spacing; 3]
    }

    /// Physical coordinate of the first cell (mm).
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// The flat scalar buffer, X varying fastest.
    pub fn scalars(&self) -> &[f32] {
        &self.scalars
    }

    /// Consume the grid, returning its scalar buffer.
    pub fn into_scalars(self) -> Vec<f32> {
        self.scalars
    }

    /// Total cell count.
    pub fn len(&self) -> usize {
        self.scalars.len()
    }

    /// True if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty()
    }

    /// Flat index for a cell.
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (iz * self.dimensions[1] + iy) * self.dimensions[0] + ix
    }

    /// Cell indices for a flat index.
    pub fn coords(&self, idx: usize) -> (usize, usize, usize) {
        let nx = self.dimensions[0];
        let ny = self.dimensions[1];
        (idx % nx, (idx / nx) % ny, idx / (nx * ny))
    }

    /// Scalar at a cell.
    pub fn get(&self, ix: usize, iy: usize, iz: usize) -> f32 {
        self.scalars[self.index(ix, iy, iz)]
    }

    /// Physical coordinates of a cell's sample point (mm).
    pub fn point(&self, ix: usize, iy: usize, iz: usize) -> [f64; 3] {
        [
            self.origin[0] + ix as f64 * self.spacing,
            self.origin[1] + iy as f64 * self.spacing,
            self.origin[2] + iz as f64 * self.spacing,
        ]
    }

    /// Volume of a single cell (mm³).
    pub fn cell_volume(&self) -> f64 {
        self.spacing * self.spacing * self.spacing
    }

    /// Number of cells carrying material (scalar above [`AIR`]).
    pub fn material_cell_count(&self) -> usize {
        self.scalars.iter().filter(|&&v| v > AIR).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_varies_fastest() {
        let grid = VolumeGrid::new([4, 3, 2], 0.5, [0.0, 0.0, 0.0], AIR);
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(0, 0, 1), 12);
        assert_eq!(grid.len(), 24);
    }

    #[test]
    fn test_coords_roundtrip() {
        let grid = VolumeGrid::new([4, 3, 2], 0.5, [0.0, 0.0, 0.0], AIR);
        for idx in 0..grid.len() {
            let (ix, iy, iz) = grid.coords(idx);
            assert_eq!(grid.index(ix, iy, iz), idx);
        }
    }

    #[test]
    fn test_point_from_origin() {
        let grid = VolumeGrid::new([4, 4, 4], 0.5, [-1.0, -1.0, 0.0], MATERIAL);
        let p = grid.point(2, 0, 3);
        assert!((p[0] - 0.0).abs() < 1e-12);
        assert!((p[1] - (-1.0)).abs() < 1e-12);
        assert!((p[2] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_with_scalars_length_check() {
        let result = VolumeGrid::with_scalars([2, 2, 2], 1.0, [0.0; 3], vec![0.0; 7]);
        assert!(matches!(result, Err(StockSimError::GridMismatch { .. })));
    }

    #[test]
    fn test_material_cell_count() {
        let mut scalars = vec![AIR; 8];
        scalars[3] = MATERIAL;
        scalars[5] = 500.0;
        let grid = VolumeGrid::with_scalars([2, 2, 2], 1.0, [0.0; 3], scalars).unwrap();
        assert_eq!(grid.material_cell_count(), 2);
    }

    #[test]
    fn test_grid_serialization() {
        let grid = VolumeGrid::new([2, 2, 1], 0.25, [-0.5, -0.5, 0.0], MATERIAL);
        let json = serde_json::to_string(&grid).unwrap();
        let parsed: VolumeGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, grid);
    }
}
