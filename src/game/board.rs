use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Smallest and largest values drawn for generated boards.
pub const MIN_CELL: u32 = 1;
pub const MAX_CELL: u32 = 9;

/// Square matrix of cell values. A value of 0 marks a cell that is taken.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    side: usize,
    cells: Vec<u32>,
}

impl Board {
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyBoard);
        }
        let side = rows.len();
        let mut cells = Vec::with_capacity(side * side);
        for row in rows {
            if row.len() != side {
                return Err(Error::NotSquare {
                    rows: side,
                    cols: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Board { side, cells })
    }

    /// Random `side`×`side` board with values in `MIN_CELL..=MAX_CELL`.
    pub fn random<R: Rng>(side: usize, rng: &mut R) -> Self {
        let cells = (0..side * side)
            .map(|_| rng.gen_range(MIN_CELL..=MAX_CELL))
            .collect();
        Board { side, cells }
    }

    /// Parses one row per non-empty line, values separated by commas or
    /// whitespace.
    pub fn parse(text: &str) -> Result<Self> {
        let mut rows: Vec<Vec<u32>> = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }
            let mut row = Vec::new();
            for value in stripped
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|v| !v.is_empty())
            {
                let parsed = i64::from_str(value).map_err(|_| Error::NonNumericCell {
                    line: line_no,
                    value: value.to_string(),
                })?;
                if parsed < 0 {
                    return Err(Error::NegativeCell {
                        line: line_no,
                        value: parsed,
                    });
                }
                let parsed = u32::try_from(parsed).map_err(|_| Error::NonNumericCell {
                    line: line_no,
                    value: value.to_string(),
                })?;
                row.push(parsed);
            }
            if let Some(first) = rows.first() {
                if first.len() != row.len() {
                    return Err(Error::RaggedRows {
                        line: line_no,
                        expected: first.len(),
                        got: row.len(),
                    });
                }
            }
            rows.push(row);
        }

        let cols = match rows.first() {
            Some(first) => first.len(),
            None => return Err(Error::EmptyBoard),
        };
        if cols != rows.len() {
            return Err(Error::NotSquare {
                rows: rows.len(),
                cols,
            });
        }
        Board::from_rows(rows)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Board::parse(&text)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        fs::write(path, self.to_text()).map_err(|e| Error::io(path, e))
    }

    /// Comma separated rows, the format `parse` reads back.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for r in 0..self.side {
            let row: Vec<String> = self.row(r).iter().map(|v| v.to_string()).collect();
            out.push_str(&row.join(", "));
            out.push('\n');
        }
        out
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.side + col]
    }

    pub fn is_available(&self, row: usize, col: usize) -> bool {
        self.get(row, col) != 0
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.side && col < self.side
    }

    /// Zeroes a cell and returns the value it held.
    pub(crate) fn take(&mut self, row: usize, col: usize) -> u32 {
        let idx = row * self.side + col;
        let value = self.cells[idx];
        self.cells[idx] = 0;
        value
    }

    pub fn row(&self, row: usize) -> &[u32] {
        let start = row * self.side;
        &self.cells[start..start + self.side]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = u32> + '_ {
        self.cells.iter().skip(col).step_by(self.side).copied()
    }

    pub fn remaining_cells(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0).count()
    }

    pub fn remaining_value(&self) -> u64 {
        self.cells.iter().map(|&v| u64::from(v)).sum()
    }
}

impl FromStr for Board {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Board::parse(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let dashes: String = (0..self.side * 4).map(|_| "-").collect();
        write!(f, "    ")?;
        for j in 0..self.side {
            write!(f, "{:>3} ", j)?;
        }
        writeln!(f)?;
        writeln!(f, "   |{}|", dashes)?;
        for i in 0..self.side {
            write!(f, "{:>2} |", i)?;
            for &v in self.row(i) {
                if v == 0 {
                    write!(f, "{:>3} ", "-")?;
                } else {
                    write!(f, "{:>3} ", v)?;
                }
            }
            writeln!(f, "|")?;
        }
        write!(f, "   |{}|", dashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn parses_commas_and_whitespace() {
        let board = Board::parse("1, 2, 3\n4 5 6\n\n7,8,  9\n").unwrap();
        assert_eq!(board.side(), 3);
        assert_eq!(board.row(1), &[4, 5, 6]);
        assert_eq!(board.column(2).collect::<Vec<_>>(), vec![3, 6, 9]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(Board::parse(""), Err(Error::EmptyBoard)));
        assert!(matches!(
            Board::parse("1, x\n2, 3"),
            Err(Error::NonNumericCell { line: 1, .. })
        ));
        assert!(matches!(
            Board::parse("1, 2\n3"),
            Err(Error::RaggedRows { line: 2, expected: 2, got: 1 })
        ));
        assert!(matches!(
            Board::parse("1, 2, 3\n4, 5, 6"),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
        assert!(matches!(
            Board::parse("1, -2\n3, 4"),
            Err(Error::NegativeCell { line: 1, value: -2 })
        ));
    }

    #[test]
    fn text_form_reads_back() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let board = Board::random(5, &mut rng);
        assert_eq!(Board::parse(&board.to_text()).unwrap(), board);
    }

    #[test]
    fn random_boards_are_seeded_and_in_range() {
        let a = Board::random(6, &mut ChaCha8Rng::seed_from_u64(12345));
        let b = Board::random(6, &mut ChaCha8Rng::seed_from_u64(12345));
        assert_eq!(a, b);
        assert_eq!(a.remaining_cells(), 36);
        for r in 0..6 {
            assert!(a.row(r).iter().all(|v| (MIN_CELL..=MAX_CELL).contains(v)));
        }
    }

    #[test]
    fn take_zeroes_cell() {
        let mut board = Board::parse("1, 2\n3, 4").unwrap();
        assert_eq!(board.take(1, 0), 3);
        assert!(!board.is_available(1, 0));
        assert_eq!(board.remaining_cells(), 3);
        assert_eq!(board.remaining_value(), 7);
    }

    #[test]
    fn display_marks_taken_cells() {
        let mut board = Board::parse("1, 2\n3, 4").unwrap();
        board.take(0, 1);
        let shown = board.to_string();
        assert!(shown.contains('-'));
        assert!(shown.contains('4'));
    }

    #[test]
    fn save_and_load_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("rcgame-board-{}", std::process::id()));
        let path = dir.join("board.txt");
        let board = Board::parse("9, 1\n2, 8").unwrap();
        board.save(&path).unwrap();
        assert_eq!(Board::load(&path).unwrap(), board);
        let _ = fs::remove_dir_all(&dir);
    }
}
