use domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

impl ApplicationError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::Domain(DomainError::NotFound { .. }))
    }

    pub fn as_domain(&self) -> &DomainError {
        match self {
            ApplicationError::Domain(err) => err,
        }
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
