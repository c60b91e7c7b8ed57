use std::fmt;

/// A single decoded spreadsheet value.
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Blank,
}

/// One decoded row. Index meaning is only fixed once a column map exists.
pub type Row = Vec<Cell>;

static BLANK: Cell = Cell::Blank;

impl Cell {
    pub fn text(&self) -> String {
        match self {
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Blank => String::new(),
        }
    }

    /// Trimmed lowercase text, the form used for header matching.
    pub fn normalized(&self) -> String {
        self.text().trim().to_lowercase()
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Blank => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Numeric reading of the cell.
    ///
    /// Text is trimmed and stripped of `,` thousands separators before
    /// parsing. Blank cells, unparseable text and non-finite values yield
    /// `None`.
    pub fn number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => {
                let cleaned = s.replace(',', "");
                let cleaned = cleaned.trim();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok()?
            }
            Cell::Blank => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// Cell at `index`, or blank when the row is too short.
pub fn cell_at(row: &[Cell], index: usize) -> &Cell {
    row.get(index).unwrap_or(&BLANK)
}

/// Builds a row from string literals; handy for tests and CSV input.
pub fn text_row<S: AsRef<str>>(values: &[S]) -> Row {
    values
        .iter()
        .map(|v| {
            let text: &str = v.as_ref();
            Cell::from(text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_strip_thousands_separators() {
        assert_eq!(Cell::from(" 1,250 ").number(), Some(1250.0));
        assert_eq!(Cell::from("12.5").number(), Some(12.5));
        assert_eq!(Cell::Number(7.0).number(), Some(7.0));
    }

    #[test]
    fn non_numeric_cells_have_no_number() {
        assert_eq!(Cell::from("abc").number(), None);
        assert_eq!(Cell::from("   ").number(), None);
        assert_eq!(Cell::Blank.number(), None);
        assert_eq!(Cell::from("inf").number(), None);
        assert_eq!(Cell::from("NaN").number(), None);
    }

    #[test]
    fn normalized_is_trimmed_lowercase() {
        assert_eq!(Cell::from("  ITEM CODE ").normalized(), "item code");
        assert_eq!(Cell::Number(42.0).normalized(), "42");
    }

    #[test]
    fn short_rows_read_as_blank() {
        let row = text_row(&["A1"]);
        assert_eq!(cell_at(&row, 0), &Cell::Text("A1".into()));
        assert!(cell_at(&row, 5).is_blank());
    }
}
