use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripError {
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
    #[error("outbound request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("agent returned transient status {0}")]
    AgentTransient(u16),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}
