#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid clock time: {0}")]
    ClockTime(#[from] carewatch_types::TimeError),

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
