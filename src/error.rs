/// Problems found while validating the body catalog.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("body `{0}` is declared more than once")]
    DuplicateName(&'static str),

    #[error("body `{name}` has a non-positive radius ({radius})")]
    InvalidRadius { name: &'static str, radius: f32 },

    #[error("body `{name}` has a non-positive orbit distance ({distance})")]
    InvalidOrbitDistance { name: &'static str, distance: f32 },
}

/// Rejected requests against the live orrery.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OrreryError {
    #[error("no body named `{0}`")]
    UnknownBody(String),

    #[error("speed factor for `{name}` must be finite, got {value}")]
    InvalidSpeedFactor { name: String, value: f32 },
}

/// Errors that can occur when loading the RON configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),
}
