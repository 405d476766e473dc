use itertools::Itertools;
use thiserror::Error;

use super::sale::Field;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error(
        "missing required columns: {}\noriginal headers: {original:?}\nafter normalization: {normalized:?}",
        .missing.iter().join(", ")
    )]
    MissingColumns {
        original: Vec<String>,
        normalized: Vec<String>,
        missing: Vec<Field>,
    },
    #[error("file {file} does not have the required columns: {}", .missing.iter().join(", "))]
    MissingMandatoryColumns { file: String, missing: Vec<Field> },
    #[error("total for {dimension} {key} is too large to add up")]
    TotalOverflow { dimension: &'static str, key: String },
}

pub type Result<T> = std::result::Result<T, Error>;
