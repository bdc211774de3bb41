use std::fmt;
use std::path::PathBuf;

/// Why an asset failed to load.
///
/// Load failures never reach the code that requested the asset; they are
/// logged and the asset simply stays unavailable.
#[derive(Debug)]
pub enum AssetError {
    /// The backing file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The bytes were read but could not be decoded.
    Decode { name: String, source: image::ImageError },
    /// The loader released its completion without resolving it.
    Unresolved,
    /// Loader-specific failure.
    Other(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            AssetError::Decode { name, source } => write!(f, "cannot decode `{name}`: {source}"),
            AssetError::Unresolved => f.write_str("loader dropped the request without a result"),
            AssetError::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io { source, .. } => Some(source),
            AssetError::Decode { source, .. } => Some(source),
            AssetError::Unresolved | AssetError::Other(_) => None,
        }
    }
}
