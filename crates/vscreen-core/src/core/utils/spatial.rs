use nalgebra::Point3;
use std::collections::HashMap;

type CellKey = (i64, i64, i64);

/// Uniform cell grid over a point set for fixed-radius neighbor queries.
///
/// Queries with a radius larger than the cell size remain correct; they just
/// visit more cells.
#[derive(Debug, Clone)]
pub struct CellGrid {
    cell_size: f64,
    points: Vec<Point3<f64>>,
    cells: HashMap<CellKey, Vec<usize>>,
}

impl CellGrid {
    pub fn new(points: Vec<Point3<f64>>, cell_size: f64) -> Self {
        let cell_size = cell_size.max(0.5);
        let mut cells: HashMap<CellKey, Vec<usize>> = HashMap::new();
        for (index, p) in points.iter().enumerate() {
            cells
                .entry(Self::key(p, cell_size))
                .or_default()
                .push(index);
        }
        Self {
            cell_size,
            points,
            cells,
        }
    }

    fn key(p: &Point3<f64>, cell_size: f64) -> CellKey {
        (
            (p.x / cell_size).floor() as i64,
            (p.y / cell_size).floor() as i64,
            (p.z / cell_size).floor() as i64,
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices and distances of all points within `radius` of `center`.
    pub fn within(&self, center: &Point3<f64>, radius: f64) -> Vec<(usize, f64)> {
        let reach = (radius / self.cell_size).ceil() as i64;
        let (cx, cy, cz) = Self::key(center, self.cell_size);
        let mut found = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &index in bucket {
                        let distance = nalgebra::distance(center, &self.points[index]);
                        if distance <= radius {
                            found.push((index, distance));
                        }
                    }
                }
            }
        }
        found.sort_unstable_by_key(|&(index, _)| index);
        found
    }
}
