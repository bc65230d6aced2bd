use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    Io(io::Error),
    Csv(csv::Error),
    Serialization(bincode::Error),
    MissingColumn {
        name: String,
    },
    Parse {
        row: usize,
        column: String,
        value: String,
    },
    InvalidTarget {
        row: usize,
    },
    EmptyDataset,
    NotEnoughRows {
        got: usize,
        needed: usize,
    },
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    InvalidParam {
        name: &'static str,
        value: f64,
    },
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MlErr::Io(e) => format!("io error: {e}"),
            MlErr::Csv(e) => format!("csv error: {e}"),
            MlErr::Serialization(e) => format!("serialization error: {e}"),
            MlErr::MissingColumn { name } => {
                format!("Column {name:?} was not found in the dataset")
            }
            MlErr::Parse { row, column, value } => {
                format!("Failed to parse {value:?} as a number at row {row}, column {column:?}")
            }
            MlErr::InvalidTarget { row } => {
                format!("The target at row {row} is missing or not a finite number")
            }
            MlErr::EmptyDataset => "The dataset has no rows".to_string(),
            MlErr::NotEnoughRows { got, needed } => {
                format!("Not enough rows, got {got} and needed at least {needed}")
            }
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => {
                format!(
                    "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
                )
            }
            MlErr::InvalidParam { name, value } => {
                format!("Invalid value {value} for parameter {name}")
            }
        };

        write!(f, "{s}")
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            MlErr::Csv(e) => Some(e),
            MlErr::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for MlErr {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<bincode::Error> for MlErr {
    fn from(value: bincode::Error) -> Self {
        Self::Serialization(value)
    }
}
