//! Terrain generation - seeded clusters of forest, mountain and water

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::components::{CellCoord, Grid, TileType};

/// Configuration for terrain generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub seed: u64,
    pub forest_clusters: u32,
    pub mountain_clusters: u32,
    pub lakes: u32,
    /// Largest cluster radius in cells
    pub max_radius: i32,
    /// Chance that a cell inside a cluster's radius is converted
    pub density: f64,
    /// Rows and columns around the centre kept as plains for a first camp
    pub clear_center: i32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            forest_clusters: 8,
            mountain_clusters: 4,
            lakes: 3,
            max_radius: 4,
            density: 0.75,
            clear_center: 5,
        }
    }
}

/// Counts of each tile type after generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerrainStats {
    pub plains: usize,
    pub water: usize,
    pub forest: usize,
    pub mountain: usize,
}

/// Reset `grid` to plains and scatter clusters. The same seed always
/// produces the same terrain.
pub fn generate_terrain(grid: &mut Grid, config: &TerrainConfig) -> TerrainStats {
    let mut rng = StdRng::seed_from_u64(config.seed);

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            grid.set_tile(CellCoord::new(x, y), TileType::Plains);
        }
    }

    // Lakes first so forests and mountains can border them
    for _ in 0..config.lakes {
        scatter_cluster(grid, &mut rng, TileType::Water, config);
    }
    for _ in 0..config.mountain_clusters {
        scatter_cluster(grid, &mut rng, TileType::Mountain, config);
    }
    for _ in 0..config.forest_clusters {
        scatter_cluster(grid, &mut rng, TileType::Forest, config);
    }

    if config.clear_center > 0 {
        let cx = grid.width() / 2;
        let cy = grid.height() / 2;
        let r = config.clear_center;
        for y in (cy - r)..=(cy + r) {
            for x in (cx - r)..=(cx + r) {
                grid.set_tile(CellCoord::new(x, y), TileType::Plains);
            }
        }
    }

    count_tiles(grid)
}

fn scatter_cluster(grid: &mut Grid, rng: &mut impl Rng, tile: TileType, config: &TerrainConfig) {
    if grid.width() == 0 || grid.height() == 0 {
        return;
    }
    let center = CellCoord::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
    let radius = rng.gen_range(1..=config.max_radius.max(1));
    let r2 = (radius * radius) as i64;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = center.offset(dx, dy);
            if center.distance_squared(&cell) > r2 {
                continue;
            }
            if rng.gen_bool(config.density.clamp(0.0, 1.0)) {
                grid.set_tile(cell, tile);
            }
        }
    }
}

pub fn count_tiles(grid: &Grid) -> TerrainStats {
    let mut stats = TerrainStats::default();
    for row in grid.tile_rows() {
        for tile in row {
            match tile {
                TileType::Plains => stats.plains += 1,
                TileType::Water => stats.water += 1,
                TileType::Forest => stats.forest += 1,
                TileType::Mountain => stats.mountain += 1,
            }
        }
    }
    stats
}
