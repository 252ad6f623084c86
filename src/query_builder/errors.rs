use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryBuildError {
    #[error("Unknown attribute `{0}`")]
    UnknownAttribute(String),

    #[error("Invalid value `{value}` for {attribute}: {reason}")]
    InvalidConstraint {
        attribute: String,
        value: String,
        reason: String,
    },
}

impl QueryBuildError {
    pub(crate) fn invalid(
        attribute: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        QueryBuildError::InvalidConstraint {
            attribute: attribute.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
