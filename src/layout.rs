// Subplot grid layout: which (x, y) pairing lands in which cell

use crate::error::{EngineError, Result};
use serde::Serialize;
use tracing::debug;

/// Which of the five layout rules produced a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutCase {
    /// Full mesh, Y varies slowest
    Cartesian,
    /// Several X variables against one Y
    Row,
    /// One X variable against several Y
    Column,
    Single,
    /// Shorter list cycled against the longer, two columns wide
    Paired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellAssignment {
    pub row: usize,
    pub col: usize,
    pub x: String,
    pub y: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutResult {
    pub case: LayoutCase,
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<CellAssignment>,
    pub shared_x_axes: bool,
    pub shared_y_axes: bool,
}

fn cell(row: usize, col: usize, x: &str, y: &str) -> CellAssignment {
    CellAssignment {
        row,
        col,
        x: x.to_string(),
        y: y.to_string(),
    }
}

/// Resolve the subplot grid for the selected variables
pub fn resolve(xs: &[String], ys: &[String], cartesian: bool) -> Result<LayoutResult> {
    if xs.is_empty() {
        return Err(EngineError::EmptySelection("x"));
    }
    if ys.is_empty() {
        return Err(EngineError::EmptySelection("y"));
    }

    let layout = match (xs.len(), ys.len(), cartesian) {
        (nx, ny, true) => LayoutResult {
            case: LayoutCase::Cartesian,
            rows: ny,
            cols: nx,
            cells: ys
                .iter()
                .enumerate()
                .flat_map(|(j, y)| xs.iter().enumerate().map(move |(i, x)| cell(j, i, x, y)))
                .collect(),
            shared_x_axes: true,
            shared_y_axes: true,
        },
        (nx, 1, false) if nx > 1 => LayoutResult {
            case: LayoutCase::Row,
            rows: 1,
            cols: nx,
            cells: xs.iter().enumerate().map(|(i, x)| cell(0, i, x, &ys[0])).collect(),
            shared_x_axes: false,
            shared_y_axes: true,
        },
        (1, ny, false) if ny > 1 => LayoutResult {
            case: LayoutCase::Column,
            rows: ny,
            cols: 1,
            cells: ys.iter().enumerate().map(|(i, y)| cell(i, 0, &xs[0], y)).collect(),
            shared_x_axes: true,
            shared_y_axes: false,
        },
        (1, 1, false) => LayoutResult {
            case: LayoutCase::Single,
            rows: 1,
            cols: 1,
            cells: vec![cell(0, 0, &xs[0], &ys[0])],
            shared_x_axes: false,
            shared_y_axes: false,
        },
        (nx, ny, false) => {
            let n = nx.max(ny);
            let m = nx.min(ny);
            let cells = (0..n)
                .map(|i| {
                    let (x, y) = if nx < ny {
                        (&xs[i % m], &ys[i])
                    } else {
                        (&xs[i], &ys[i % m])
                    };
                    cell(i / 2, i % 2, x, y)
                })
                .collect();
            LayoutResult {
                case: LayoutCase::Paired,
                rows: 1 + (n - 1) / 2,
                cols: 2,
                cells,
                shared_x_axes: false,
                shared_y_axes: false,
            }
        }
    };

    debug!(case = ?layout.case, rows = layout.rows, cols = layout.cols, "resolved grid layout");
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn pairs(layout: &LayoutResult) -> Vec<(usize, usize, &str, &str)> {
        layout
            .cells
            .iter()
            .map(|c| (c.row, c.col, c.x.as_str(), c.y.as_str()))
            .collect()
    }

    #[test]
    fn test_single_cell() {
        let layout = resolve(&names("x", 1), &names("y", 1), false).unwrap();
        assert_eq!(layout.case, LayoutCase::Single);
        assert_eq!((layout.rows, layout.cols), (1, 1));
        assert_eq!(pairs(&layout), vec![(0, 0, "x0", "y0")]);
    }

    #[test]
    fn test_cartesian_mesh() {
        let layout = resolve(&names("x", 3), &names("y", 2), true).unwrap();
        assert_eq!(layout.case, LayoutCase::Cartesian);
        assert_eq!((layout.rows, layout.cols), (2, 3));
        assert_eq!(layout.cells.len(), 6);
        assert_eq!(layout.cells[1], cell(0, 1, "x1", "y0"));
        assert_eq!(layout.cells[3], cell(1, 0, "x0", "y1"));

        let mut unique: Vec<(&str, &str)> =
            layout.cells.iter().map(|c| (c.x.as_str(), c.y.as_str())).collect();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6);
        assert!(layout.shared_x_axes && layout.shared_y_axes);
    }

    #[test]
    fn test_cartesian_takes_priority_over_single() {
        let layout = resolve(&names("x", 1), &names("y", 1), true).unwrap();
        assert_eq!(layout.case, LayoutCase::Cartesian);
        assert_eq!(layout.cells.len(), 1);
    }

    #[test]
    fn test_row_layout() {
        let layout = resolve(&names("x", 3), &names("y", 1), false).unwrap();
        assert_eq!(layout.case, LayoutCase::Row);
        assert_eq!((layout.rows, layout.cols), (1, 3));
        assert_eq!(
            pairs(&layout),
            vec![(0, 0, "x0", "y0"), (0, 1, "x1", "y0"), (0, 2, "x2", "y0")]
        );
        assert!(layout.shared_y_axes && !layout.shared_x_axes);
    }

    #[test]
    fn test_column_layout() {
        let layout = resolve(&names("x", 1), &names("y", 2), false).unwrap();
        assert_eq!(layout.case, LayoutCase::Column);
        assert_eq!((layout.rows, layout.cols), (2, 1));
        assert_eq!(pairs(&layout), vec![(0, 0, "x0", "y0"), (1, 0, "x0", "y1")]);
        assert!(layout.shared_x_axes && !layout.shared_y_axes);
    }

    #[test]
    fn test_paired_fallback() {
        let layout = resolve(&names("x", 3), &names("y", 2), false).unwrap();
        assert_eq!(layout.case, LayoutCase::Paired);
        assert_eq!((layout.rows, layout.cols), (2, 2));
        assert_eq!(
            pairs(&layout),
            vec![(0, 0, "x0", "y0"), (0, 1, "x1", "y1"), (1, 0, "x2", "y0")]
        );
    }

    #[test]
    fn test_paired_cycles_shorter_x() {
        let layout = resolve(&names("x", 2), &names("y", 5), false).unwrap();
        assert_eq!((layout.rows, layout.cols), (3, 2));
        let xs: Vec<&str> = layout.cells.iter().map(|c| c.x.as_str()).collect();
        assert_eq!(xs, vec!["x0", "x1", "x0", "x1", "x0"]);
    }

    #[test]
    fn test_paired_equal_lengths_zip() {
        let layout = resolve(&names("x", 2), &names("y", 2), false).unwrap();
        assert_eq!(layout.case, LayoutCase::Paired);
        assert_eq!(pairs(&layout), vec![(0, 0, "x0", "y0"), (0, 1, "x1", "y1")]);
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(
            resolve(&[], &names("y", 1), false),
            Err(EngineError::EmptySelection("x"))
        );
        assert_eq!(
            resolve(&names("x", 1), &[], true),
            Err(EngineError::EmptySelection("y"))
        );
    }

    #[test]
    fn test_cells_stay_inside_grid() {
        for nx in 1..6 {
            for ny in 1..6 {
                for cartesian in [false, true] {
                    let layout = resolve(&names("x", nx), &names("y", ny), cartesian).unwrap();
                    let max_row = layout.cells.iter().map(|c| c.row).max().unwrap();
                    let max_col = layout.cells.iter().map(|c| c.col).max().unwrap();
                    assert!(max_row < layout.rows);
                    assert!(max_col < layout.cols);

                    let mut positions: Vec<(usize, usize)> =
                        layout.cells.iter().map(|c| (c.row, c.col)).collect();
                    positions.sort();
                    positions.dedup();
                    assert_eq!(positions.len(), layout.cells.len());
                }
            }
        }
    }
}
