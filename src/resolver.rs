use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

/// Source text fetched for an `import`, with the origin it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Canonical path or URL; used to detect import cycles.
    pub origin: String,
    pub source: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("file `{}` doesn't exist", .0.display())]
    Missing(PathBuf),
    #[error("only files with the `.{expected}` extension can be imported, found `{}`", .path.display())]
    Extension { path: PathBuf, expected: String },
    #[error("cannot read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("GET {url} failed: {reason}")]
    Remote { url: String, reason: String },
}

/// Turns an import address into source text. Returns every strategy's
/// failure when the address cannot be resolved.
pub trait ResourceResolver {
    fn resolve(&self, address: &str) -> Result<Resource, Vec<ResolveError>>;
}

/// Local file lookup first, then a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct SourceResolver {
    extension: String,
    timeout: Duration,
}

impl SourceResolver {
    pub fn new(extension: impl Into<String>, timeout: Duration) -> Self {
        Self {
            extension: extension.into(),
            timeout,
        }
    }

    pub fn local(&self, address: &str) -> Result<Resource, ResolveError> {
        let path = Path::new(address);
        if !path.is_file() {
            return Err(ResolveError::Missing(path.to_path_buf()));
        }
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
        if !matches_extension {
            return Err(ResolveError::Extension {
                path: path.to_path_buf(),
                expected: self.extension.clone(),
            });
        }
        let io_error = |source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_error)?;
        let source = fs::read_to_string(&canonical).map_err(io_error)?;
        Ok(Resource {
            origin: canonical.display().to_string(),
            source,
        })
    }

    pub fn remote(&self, address: &str) -> Result<Resource, ResolveError> {
        let failure = |reason: String| ResolveError::Remote {
            url: address.to_string(),
            reason,
        };
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .get(address)
            .call()
            .map_err(|err| failure(err.to_string()))?;
        let source = response
            .into_string()
            .map_err(|err| failure(err.to_string()))?;
        Ok(Resource {
            origin: address.to_string(),
            source,
        })
    }
}

impl ResourceResolver for SourceResolver {
    fn resolve(&self, address: &str) -> Result<Resource, Vec<ResolveError>> {
        let local_error = match self.local(address) {
            Ok(resource) => return Ok(resource),
            Err(err) => err,
        };
        self.remote(address)
            .map_err(|remote_error| vec![local_error, remote_error])
    }
}
