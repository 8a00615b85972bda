use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("resolution was cancelled")]
    Cancelled,
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid resolver settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("hides-members name must not be empty")]
    EmptyHidesMembersName,
}
