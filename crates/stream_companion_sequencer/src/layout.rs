// SPDX-License-Identifier: MIT OR Apache-2.0
//! Grid placement for groups of cards.
//!
//! All values are in normalized canvas units (`0.0..=1.0`), matching the
//! `position` and `size` element properties.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// Grid needs at least one column
    #[error("columns must be greater than zero")]
    NoColumns,

    /// Spacing eats the whole area
    #[error("spacing leaves no room for cards ({axis} axis)")]
    NoRoom {
        /// `"horizontal"` or `"vertical"`
        axis: &'static str,
    },
}

/// Top-left corner of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPosition {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
}

/// Grid parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Cells per row
    pub columns: usize,
    /// Gap between rows
    pub vertical_spacing: f64,
    /// Gap between columns
    pub horizontal_spacing: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            columns: 2,
            vertical_spacing: 0.02,
            horizontal_spacing: 0.02,
        }
    }
}

/// Place `count` cells row by row inside a `width` × `height` area at the
/// origin, sizing cells to fill it.
pub fn grid_positions(
    count: usize,
    width: f64,
    height: f64,
    grid: GridSpec,
) -> Result<Vec<GridPosition>, LayoutError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if grid.columns == 0 {
        return Err(LayoutError::NoColumns);
    }

    let columns = grid.columns;
    let rows = count.div_ceil(columns);
    let card_width =
        (width - (columns as f64 - 1.0) * grid.horizontal_spacing) / columns as f64;
    let card_height = (height - (rows as f64 - 1.0) * grid.vertical_spacing) / rows as f64;
    if card_width <= 0.0 {
        return Err(LayoutError::NoRoom { axis: "horizontal" });
    }
    if card_height <= 0.0 {
        return Err(LayoutError::NoRoom { axis: "vertical" });
    }

    Ok((0..count)
        .map(|index| {
            let (row, col) = (index / columns, index % columns);
            GridPosition {
                x: col as f64 * (card_width + grid.horizontal_spacing),
                y: row as f64 * (card_height + grid.vertical_spacing),
            }
        })
        .collect())
}

/// Place `count` cells of a fixed `card_width` × `card_height`, with the
/// grid's total extent derived from the cell size and spacing.
pub fn centered_grid_positions(
    count: usize,
    card_width: f64,
    card_height: f64,
    grid: GridSpec,
) -> Result<Vec<GridPosition>, LayoutError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if grid.columns == 0 {
        return Err(LayoutError::NoColumns);
    }

    let columns = grid.columns as f64;
    let rows = count.div_ceil(grid.columns) as f64;
    let width = columns * card_width + (columns - 1.0) * grid.horizontal_spacing;
    let height = rows * card_height + (rows - 1.0) * grid.vertical_spacing;
    grid_positions(count, width, height, grid)
}
