use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Cannot normalize an empty list of values")]
    EmptyInput,

    #[error("Magnitude {0} is not a positive finite number")]
    InvalidMagnitude(f64),
}
