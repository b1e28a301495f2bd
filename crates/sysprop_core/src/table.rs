//! Multi-dimensional result tables
//!
//! A [`Table`] maps a row [`AxisKey`] and a column [`AxisKey`] to a [`Scalar`].
//! Values come from a cell function evaluated on first access and memoized
//! per cell. Header spans for merged-cell output are precomputed when the
//! table is built.

use std::collections::{HashMap, HashSet};
use std::fmt;

use parking_lot::Mutex;

use crate::error::{CellError, CoreError, Result};
use crate::key::{AxisKey, Key, Scalar};

type CellFn = Box<dyn Fn(&AxisKey, &AxisKey) -> std::result::Result<Scalar, CellError> + Send + Sync>;

/// Longest name accepted for a table; names are reused as file names.
const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Cols,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Rows => "rows",
            Axis::Cols => "columns",
        }
    }
}

/// Per-dimension titles of an axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisTitles(Vec<String>);

impl AxisTitles {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for AxisTitles {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for AxisTitles {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for AxisTitles {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl<const N: usize> From<[&str; N]> for AxisTitles {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

struct AxisData {
    keys: Vec<AxisKey>,
    titles: Vec<String>,
    index: HashMap<AxisKey, usize>,
    /// `spans[position][dim]`
    spans: Vec<Vec<usize>>,
}

impl AxisData {
    fn new(table: &str, axis: Axis, keys: Vec<AxisKey>, titles: AxisTitles) -> Result<Self> {
        let titles = titles.0;
        if titles.is_empty() {
            return Err(CoreError::invalid_table(
                table,
                format!("the {} axis needs at least one title", axis.label()),
            ));
        }

        let mut index = HashMap::with_capacity(keys.len());
        for (position, key) in keys.iter().enumerate() {
            if key.arity() != titles.len() {
                return Err(CoreError::invalid_table(
                    table,
                    format!(
                        "{} key ({}) has {} dimensions, expected {}",
                        axis.label(),
                        key,
                        key.arity(),
                        titles.len()
                    ),
                ));
            }
            if index.insert(key.clone(), position).is_some() {
                return Err(CoreError::invalid_table(
                    table,
                    format!("duplicate {} key ({})", axis.label(), key),
                ));
            }
        }

        let spans = compute_spans(&keys, titles.len());
        Ok(Self {
            keys,
            titles,
            index,
            spans,
        })
    }
}

/// Run lengths of identical key prefixes, per position and dimension.
///
/// The first position of a run holds the run length, the rest hold 0. A run at
/// dimension `d` requires dimensions `0..=d` to match, so runs never cross an
/// outer boundary.
fn compute_spans(keys: &[AxisKey], dims: usize) -> Vec<Vec<usize>> {
    let mut spans = vec![vec![0; dims]; keys.len()];
    for dim in 0..dims {
        let mut start = 0;
        while start < keys.len() {
            let prefix = keys[start].prefix(dim + 1);
            let mut end = start + 1;
            while end < keys.len() && keys[end].prefix(dim + 1) == prefix {
                end += 1;
            }
            spans[start][dim] = end - start;
            start = end;
        }
    }
    spans
}

/// A named two-axis array of lazily computed values
pub struct Table {
    name: String,
    title: String,
    rows: AxisData,
    cols: AxisData,
    func: CellFn,
    cache: Mutex<HashMap<(usize, usize), Scalar>>,
}

impl Table {
    /// Build a table from its axes and a cell function.
    ///
    /// `func` must succeed for every pair in `rows × cols`; a failure surfaces
    /// as [`CoreError::Computation`] when the cell is first read.
    pub fn new<R, C, F>(
        name: impl Into<String>,
        title: impl Into<String>,
        rows: R,
        rows_title: impl Into<AxisTitles>,
        cols: C,
        cols_title: impl Into<AxisTitles>,
        func: F,
    ) -> Result<Self>
    where
        R: IntoIterator,
        R::Item: Into<AxisKey>,
        C: IntoIterator,
        C::Item: Into<AxisKey>,
        F: Fn(&AxisKey, &AxisKey) -> std::result::Result<Scalar, CellError> + Send + Sync + 'static,
    {
        let name = name.into();
        validate_name(&name)?;

        let rows = AxisData::new(
            &name,
            Axis::Rows,
            rows.into_iter().map(Into::into).collect(),
            rows_title.into(),
        )?;
        let cols = AxisData::new(
            &name,
            Axis::Cols,
            cols.into_iter().map(Into::into).collect(),
            cols_title.into(),
        )?;

        Ok(Self {
            name,
            title: title.into(),
            rows,
            cols,
            func: Box::new(func),
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn builder(name: impl Into<String>) -> TableBuilder {
        TableBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[AxisKey] {
        &self.rows.keys
    }

    pub fn cols(&self) -> &[AxisKey] {
        &self.cols.keys
    }

    pub fn keys(&self, axis: Axis) -> &[AxisKey] {
        &self.axis(axis).keys
    }

    pub fn row_dims(&self) -> usize {
        self.rows.titles.len()
    }

    pub fn col_dims(&self) -> usize {
        self.cols.titles.len()
    }

    pub fn row_titles(&self) -> &[String] {
        &self.rows.titles
    }

    pub fn col_titles(&self) -> &[String] {
        &self.cols.titles
    }

    /// All row dimension titles as one label
    pub fn rows_title(&self) -> String {
        self.rows.titles.join(", ")
    }

    /// All column dimension titles as one label
    pub fn cols_title(&self) -> String {
        self.cols.titles.join(", ")
    }

    /// The value of one cell, computed on first access and cached after.
    pub fn value_at(&self, row: &AxisKey, col: &AxisKey) -> Result<Scalar> {
        let row_ix = self.position(Axis::Rows, row)?;
        let col_ix = self.position(Axis::Cols, col)?;
        self.cell(row_ix, col_ix)
    }

    /// Like [`Table::value_at`], addressed by axis positions.
    pub(crate) fn cell(&self, row_ix: usize, col_ix: usize) -> Result<Scalar> {
        if let Some(value) = self.cache.lock().get(&(row_ix, col_ix)) {
            return Ok(value.clone());
        }

        let row = &self.rows.keys[row_ix];
        let col = &self.cols.keys[col_ix];
        let value = (self.func)(row, col).map_err(|cause| CoreError::Computation {
            table: self.name.clone(),
            row: row.to_string(),
            col: col.to_string(),
            cause,
        })?;

        self.cache.lock().insert((row_ix, col_ix), value.clone());
        Ok(value)
    }

    /// Values of one row in column order, empty past the last row
    pub(crate) fn row_values(&self, row_ix: usize) -> impl Iterator<Item = Result<Scalar>> + '_ {
        let n_cols = if row_ix < self.rows.keys.len() {
            self.cols.keys.len()
        } else {
            0
        };
        (0..n_cols).map(move |col_ix| self.cell(row_ix, col_ix))
    }

    /// Unique values at dimension `dim` of an axis, in first-occurrence order.
    pub fn distinct_axis_values(&self, dim: usize, axis: Axis) -> impl Iterator<Item = &Key> + '_ {
        let mut seen = HashSet::new();
        self.axis(axis)
            .keys
            .iter()
            .filter_map(move |key| key.get(dim).filter(|part| seen.insert(*part)))
    }

    /// Header span of `key` at dimension `dim`.
    ///
    /// 0 when the key continues a run started by an earlier key, otherwise
    /// the length of the run starting at `key`. `None` when the key is not on
    /// the axis or `dim` is out of range.
    pub fn span_at(&self, key: &AxisKey, dim: usize, axis: Axis) -> Option<usize> {
        let data = self.axis(axis);
        let position = *data.index.get(key)?;
        data.spans[position].get(dim).copied()
    }

    /// Spans of every dimension at an axis position, empty past the end
    pub(crate) fn spans(&self, axis: Axis, position: usize) -> &[usize] {
        self.axis(axis)
            .spans
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn axis(&self, axis: Axis) -> &AxisData {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Cols => &self.cols,
        }
    }

    fn position(&self, axis: Axis, key: &AxisKey) -> Result<usize> {
        self.axis(axis)
            .index
            .get(key)
            .copied()
            .ok_or_else(|| CoreError::KeyNotFound {
                table: self.name.clone(),
                axis: axis.label(),
                key: key.to_string(),
            })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("rows", &self.rows.keys)
            .field("row_titles", &self.rows.titles)
            .field("cols", &self.cols.keys)
            .field("col_titles", &self.cols.titles)
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(CoreError::invalid_table(
            name,
            format!("name must be between 1 and {MAX_NAME_LEN} characters"),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreError::invalid_table(
            name,
            "name may only contain ASCII letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

/// Builder for [`Table`]
#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    title: Option<String>,
    rows: Vec<AxisKey>,
    rows_title: AxisTitles,
    cols: Vec<AxisKey>,
    cols_title: AxisTitles,
}

impl TableBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            rows: Vec::new(),
            rows_title: AxisTitles(Vec::new()),
            cols: Vec::new(),
            cols_title: AxisTitles(Vec::new()),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn rows<I>(mut self, title: impl Into<AxisTitles>, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AxisKey>,
    {
        self.rows_title = title.into();
        self.rows = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn cols<I>(mut self, title: impl Into<AxisTitles>, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AxisKey>,
    {
        self.cols_title = title.into();
        self.cols = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Finish with a fallible cell function
    pub fn compute<F>(self, func: F) -> Result<Table>
    where
        F: Fn(&AxisKey, &AxisKey) -> std::result::Result<Scalar, CellError> + Send + Sync + 'static,
    {
        let title = self.title.unwrap_or_else(|| self.name.clone());
        Table::new(
            self.name,
            title,
            self.rows,
            self.rows_title,
            self.cols,
            self.cols_title,
            func,
        )
    }

    /// Finish with a cell function that cannot fail
    pub fn values<F, V>(self, func: F) -> Result<Table>
    where
        F: Fn(&AxisKey, &AxisKey) -> V + Send + Sync + 'static,
        V: Into<Scalar>,
    {
        self.compute(move |row, col| Ok(func(row, col).into()))
    }
}
