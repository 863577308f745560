//! Column schema of dataset files.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Expected shape of each line of a dataset file.
///
/// The default is exactly two non-empty columns, `word` and `transcription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column names, used in reports only.
    pub names: Vec<String>,
    /// Minimum number of columns per line.
    pub min_columns: usize,
    /// Maximum number of columns per line. `None` means unbounded.
    pub max_columns: Option<usize>,
    /// Accept empty values in the first `min_columns` columns.
    pub allow_empty: bool,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            names: vec!["word".to_string(), "transcription".to_string()],
            min_columns: 2,
            max_columns: Some(2),
            allow_empty: false,
        }
    }
}

impl ColumnSchema {
    /// Exactly `columns` columns.
    pub fn exact(columns: usize) -> Self {
        Self::range(columns, columns)
    }

    /// Between `min` and `max` columns inclusive.
    pub fn range(min: usize, max: usize) -> Self {
        Self {
            names: Vec::new(),
            min_columns: min.max(1),
            max_columns: Some(max.max(min).max(1)),
            allow_empty: false,
        }
    }

    /// At least `min` columns.
    pub fn at_least(min: usize) -> Self {
        Self {
            names: Vec::new(),
            min_columns: min.max(1),
            max_columns: None,
            allow_empty: false,
        }
    }

    /// Set column names.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Allow empty required fields.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Check the fields of one line. Returns a description of the problem.
    pub fn check(&self, fields: &[&str]) -> Result<(), String> {
        let found = fields.len();
        let too_many = self.max_columns.is_some_and(|max| found > max);
        if found < self.min_columns || too_many {
            return Err(format!("expected {self}, found {found}"));
        }

        if !self.allow_empty {
            if let Some(pos) = fields[..self.min_columns]
                .iter()
                .position(|f| f.trim().is_empty())
            {
                return Err(format!("empty {}", self.column_name(pos)));
            }
        }

        Ok(())
    }

    fn column_name(&self, pos: usize) -> String {
        match self.names.get(pos) {
            Some(name) => format!("`{name}` column"),
            None => format!("column {}", pos + 1),
        }
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_columns {
            Some(max) if max == self.min_columns => write!(f, "{max} column(s)"),
            Some(max) => write!(f, "{}-{max} columns", self.min_columns),
            None => write!(f, "at least {} column(s)", self.min_columns),
        }
    }
}

/// Parses `N`, `MIN-MAX` or `MIN+`.
impl FromStr for ColumnSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number = |v: &str| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid column count `{v}`"))
        };

        if let Some(min) = s.strip_suffix('+') {
            return Ok(Self::at_least(number(min)?));
        }
        if let Some((min, max)) = s.split_once('-') {
            let (min, max) = (number(min)?, number(max)?);
            if min > max {
                return Err(format!("invalid column range `{s}`"));
            }
            return Ok(Self::range(min, max));
        }
        let n = number(s)?;
        if n == 2 {
            return Ok(Self::default());
        }
        Ok(Self::exact(n))
    }
}
