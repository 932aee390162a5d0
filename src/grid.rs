use serde::Deserialize;

use crate::error::{MutantError, Result};

/// One row of a request grid: either a string (`"ATGC"`) or a list of
/// single-character strings (`["A", "T", "G", "C"]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GridRow {
    Text(String),
    Cells(Vec<String>),
}

impl GridRow {
    fn to_chars(&self, row: usize) -> Result<Vec<char>> {
        match self {
            GridRow::Text(text) => Ok(text.chars().collect()),
            GridRow::Cells(cells) => cells
                .iter()
                .enumerate()
                .map(|(col, cell)| {
                    let mut chars = cell.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => Ok(c),
                        _ => Err(MutantError::MalformedGrid(format!(
                            "cell ({}, {}) must be a single character, got {:?}",
                            row, col, cell
                        ))),
                    }
                })
                .collect(),
        }
    }
}

/// Square matrix of DNA bases, one `char` per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<char>>,
}

impl Grid {
    /// Builds a grid from string rows, rejecting anything that is not N×N.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        Self::from_cells(rows.iter().map(|row| row.as_ref().chars().collect()).collect())
    }

    /// Builds a grid from request rows in either accepted form.
    pub fn from_rows(rows: &[GridRow]) -> Result<Self> {
        let cells = rows
            .iter()
            .enumerate()
            .map(|(index, row)| row.to_chars(index))
            .collect::<Result<Vec<_>>>()?;
        Self::from_cells(cells)
    }

    fn from_cells(cells: Vec<Vec<char>>) -> Result<Self> {
        let size = cells.len();
        if let Some((index, row)) = cells.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(MutantError::MalformedGrid(format!(
                "row {} has {} cells, expected {}",
                index,
                row.len(),
                size
            )));
        }
        Ok(Self { cells })
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn row(&self, row: usize) -> &[char] {
        &self.cells[row]
    }

    pub fn transpose(&self) -> Self {
        let n = self.size();
        let cells = (0..n)
            .map(|col| (0..n).map(|row| self.cells[row][col]).collect())
            .collect();
        Self { cells }
    }
}
