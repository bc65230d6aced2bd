use std::{fs::File, io::Read, path::Path};

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::error::{MlErr, Result};

/// A labeled table of numeric features held in memory.
///
/// `x` is laid out as rows × features and `features` names its columns in order.
/// Missing feature values are stored as `NaN`.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Vec<String>,
    x: Array2<f32>,
    y: Array1<f32>,
}

impl Dataset {
    /// Returns a new `Dataset`.
    ///
    /// # Arguments
    /// * `features` - The name of every column of `x`.
    /// * `x` - The feature matrix, one row per sample.
    /// * `y` - The target of every sample.
    ///
    /// # Returns
    /// An error if the three sizes don't agree or if there are no rows.
    pub fn new(features: Vec<String>, x: Array2<f32>, y: Array1<f32>) -> Result<Self> {
        if features.len() != x.ncols() {
            return Err(MlErr::SizeMismatch {
                a: "features",
                b: "x columns",
                got: features.len(),
                expected: x.ncols(),
            });
        }

        if y.len() != x.nrows() {
            return Err(MlErr::SizeMismatch {
                a: "y",
                b: "x rows",
                got: y.len(),
                expected: x.nrows(),
            });
        }

        if y.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        Ok(Self { features, x, y })
    }

    /// Loads a dataset from a headered csv file.
    ///
    /// See [`Dataset::from_reader`].
    pub fn from_csv<P: AsRef<Path>>(path: P, target: &str, drop: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading dataset from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file, target, drop)
    }

    /// Reads a dataset from headered csv data.
    ///
    /// Every column that is neither `target` nor listed in `drop` becomes a feature, in file
    /// order. Empty cells and the usual missing value markers (`NA`, `N/A`, `NULL`, `#N/A` and
    /// alike) are loaded as missing values.
    ///
    /// # Arguments
    /// * `reader` - The csv source.
    /// * `target` - The name of the column to predict.
    /// * `drop` - Columns that are neither features nor the target.
    ///
    /// # Returns
    /// An error if a named column doesn't exist, a feature cell isn't numeric or a target
    /// isn't a finite number.
    pub fn from_reader<R: Read>(reader: R, target: &str, drop: &[&str]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| MlErr::MissingColumn {
                    name: name.to_string(),
                })
        };

        let target_col = position(target)?;
        let mut skip = vec![false; headers.len()];
        skip[target_col] = true;
        for name in drop {
            skip[position(name)?] = true;
        }

        let columns: Vec<usize> = (0..headers.len()).filter(|&i| !skip[i]).collect();
        let features: Vec<String> = columns.iter().map(|&i| headers[i].to_string()).collect();

        let mut data = Vec::new();
        let mut y = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record?;

            for &col in &columns {
                let cell = record.get(col).unwrap_or_default();
                let value = parse_cell(cell).ok_or_else(|| MlErr::Parse {
                    row,
                    column: headers[col].to_string(),
                    value: cell.to_string(),
                })?;

                data.push(value);
            }

            let label = record
                .get(target_col)
                .and_then(parse_cell)
                .filter(|v| v.is_finite())
                .ok_or(MlErr::InvalidTarget { row })?;

            y.push(label);
        }

        if y.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        let rows = y.len();
        let cells = data.len();
        let x = Array2::from_shape_vec((rows, columns.len()), data).map_err(|_| {
            MlErr::SizeMismatch {
                a: "cells",
                b: "rows × columns",
                got: cells,
                expected: rows * columns.len(),
            }
        })?;

        debug!("loaded {rows} rows with {} features", features.len());
        Self::new(features, x, Array1::from(y))
    }

    /// The feature names, in column order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, f32> {
        self.y.view()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Returns a new dataset with only the given rows, in the given order.
    ///
    /// # Panics
    /// If any index is out of bounds.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Self {
            features: self.features.clone(),
            x: self.x.select(Axis(0), rows),
            y: self.y.select(Axis(0), rows),
        }
    }

    /// Returns a new dataset with only the named features, in the order they are given.
    ///
    /// # Returns
    /// An error if any name isn't a feature of this dataset.
    pub fn select_features(&self, names: &[String]) -> Result<Dataset> {
        let cols = names
            .iter()
            .map(|name| {
                self.features
                    .iter()
                    .position(|f| f == name)
                    .ok_or_else(|| MlErr::MissingColumn { name: name.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features: names.to_vec(),
            x: self.x.select(Axis(1), &cols),
            y: self.y.clone(),
        })
    }
}

/// Cell contents read as a missing value, on top of the empty cell and anything that parses as
/// `NaN`.
const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "#N/A", "#N/A N/A", "#NA", "<NA>", "NULL", "null", "None", "-NaN",
    "-nan", "1.#IND", "-1.#IND", "1.#QNAN", "-1.#QNAN",
];

fn parse_cell(cell: &str) -> Option<f32> {
    if cell.is_empty() || MISSING_TOKENS.contains(&cell) {
        return Some(f32::NAN);
    }

    cell.parse().ok()
}

/// Splits the dataset's rows in a shuffled train and test partition.
///
/// # Arguments
/// * `dataset` - The dataset to split.
/// * `test_size` - The fraction of rows that go to the test partition, rounded up.
/// * `seed` - The seed of the shuffle.
///
/// # Returns
/// The `(train, test)` pair, or an error if either side would end up empty.
pub fn train_test_split(
    dataset: &Dataset,
    test_size: f64,
    seed: u64,
) -> Result<(Dataset, Dataset)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MlErr::InvalidParam {
            name: "test_size",
            value: test_size,
        });
    }

    let n = dataset.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test >= n {
        return Err(MlErr::NotEnoughRows { got: n, needed: 2 });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let (test, train) = indices.split_at(n_test);
    Ok((dataset.select_rows(train), dataset.select_rows(test)))
}

/// K-fold cross validation splitter over contiguous, unshuffled folds.
#[derive(Debug, Clone, Copy)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    /// Returns a new `KFold`, `n_splits` must be at least 2.
    pub fn new(n_splits: usize) -> Result<Self> {
        if n_splits < 2 {
            return Err(MlErr::InvalidParam {
                name: "n_splits",
                value: n_splits as f64,
            });
        }

        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Splits `n` rows in `n_splits` `(train, validation)` index pairs.
    ///
    /// The first `n % n_splits` folds hold one extra row.
    pub fn split(&self, n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        let k = self.n_splits;
        if n < k {
            return Err(MlErr::NotEnoughRows { got: n, needed: k });
        }

        let mut folds = Vec::with_capacity(k);
        let mut start = 0;

        for i in 0..k {
            let size = n / k + usize::from(i < n % k);
            let end = start + size;

            let train = (0..start).chain(end..n).collect();
            let valid = (start..end).collect();
            folds.push((train, valid));

            start = end;
        }

        Ok(folds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
SMILES,MolWeight,LogP,StdInChIKey,LogS
CCO,46.07,-0.31,LFQSCWFLJHTTHZ,1.10
c1ccccc1,78.11,2.13,UHOVQNZJYSORNB,-1.64
CC(=O)O,60.05,,QTBSBXVTEAMEQO,1.22
";

    #[test]
    fn dataset_from_reader_keeps_features_in_file_order() {
        let ds = Dataset::from_reader(CSV.as_bytes(), "LogS", &["SMILES", "StdInChIKey"]).unwrap();

        assert_eq!(ds.features(), ["MolWeight", "LogP"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.x()[[1, 0]], 78.11);
        assert_eq!(ds.y()[2], 1.22);
        assert!(ds.x()[[2, 1]].is_nan());
    }

    #[test]
    fn dataset_reads_missing_value_markers() {
        let csv = "a,LogS\nNA,1.0\nN/A,1.0\nNULL,1.0\nnull,1.0\n#N/A,1.0\nNaN,1.0\n2.5,1.0\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "LogS", &[]).unwrap();

        assert_eq!(ds.len(), 7);
        assert_eq!(ds.x().iter().filter(|v| v.is_nan()).count(), 6);
        assert_eq!(ds.x()[[6, 0]], 2.5);

        let csv = "a,LogS\nmissing,1.0\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "LogS", &[]),
            Err(MlErr::Parse { row: 0, .. })
        ));
    }

    #[test]
    fn dataset_unknown_drop_column_fails() {
        let err = Dataset::from_reader(CSV.as_bytes(), "LogS", &["Train_test"]).unwrap_err();
        assert!(matches!(err, MlErr::MissingColumn { name } if name == "Train_test"));
    }

    #[test]
    fn dataset_non_numeric_feature_fails() {
        let err = Dataset::from_reader(CSV.as_bytes(), "LogS", &["StdInChIKey"]).unwrap_err();
        assert!(matches!(err, MlErr::Parse { row: 0, ref column, .. } if column == "SMILES"));
    }

    #[test]
    fn dataset_missing_target_fails() {
        let csv = "a,LogS\n1.0,2.0\n2.0,\n";
        let err = Dataset::from_reader(csv.as_bytes(), "LogS", &[]).unwrap_err();
        assert!(matches!(err, MlErr::InvalidTarget { row: 1 }));
    }

    #[test]
    fn dataset_select_features_follows_requested_order() {
        let ds = Dataset::from_reader(CSV.as_bytes(), "LogS", &["SMILES", "StdInChIKey"]).unwrap();
        let picked = ds
            .select_features(&["LogP".to_string(), "MolWeight".to_string()])
            .unwrap();

        assert_eq!(picked.features(), ["LogP", "MolWeight"]);
        assert_eq!(picked.x()[[0, 1]], 46.07);
        assert!(ds.select_features(&["Nope".to_string()]).is_err());
    }

    fn linear(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f32);
        let y = Array1::from_shape_fn(n, |i| i as f32);
        Dataset::new(vec!["i".into()], x, y).unwrap()
    }

    #[test]
    fn split_is_deterministic_and_disjoint() {
        let ds = linear(10);
        let (train, test) = train_test_split(&ds, 0.2, 42).unwrap();
        let (train2, test2) = train_test_split(&ds, 0.2, 42).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(train.y(), train2.y());
        assert_eq!(test.y(), test2.y());

        let mut all: Vec<f32> = train.y().iter().chain(test.y().iter()).copied().collect();
        all.sort_by(f32::total_cmp);
        assert_eq!(all, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn split_rounds_test_size_up() {
        let (train, test) = train_test_split(&linear(11), 0.2, 0).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn kfold_covers_every_row_once() {
        let folds = KFold::new(3).unwrap().split(10).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|(_, v)| v.len()).collect();
        assert_eq!(sizes, [4, 3, 3]);

        assert_eq!(folds[1].1, [4, 5, 6]);
        assert_eq!(folds[1].0, [0, 1, 2, 3, 7, 8, 9]);
        assert!(KFold::new(3).unwrap().split(2).is_err());
        assert!(KFold::new(1).is_err());
    }
}
