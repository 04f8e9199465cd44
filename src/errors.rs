use thiserror::Error;

/// Stage at which a network call to the provider failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// Short EPG listing for a channel
    Epg,
    /// VOD metadata for a movie
    MovieInfo,
    /// Category/stream listings
    Listings,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FetchStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            FetchStage::Epg => "EPG",
            FetchStage::MovieInfo => "Movie Info",
            FetchStage::Listings => "Listings",
        }
    }
}

/// Error type for everything that crosses the core boundary.
///
/// Component state machines never return these: they are total over their
/// input. Errors only come out of the I/O edges (config, store, HTTP) and are
/// turned into placeholder state or host signals by the caller.
#[derive(Debug, Error, Clone)]
pub enum IptvError {
    /// Transient network failure; callers degrade to empty state
    #[error("{0} request failed: {1}")]
    Network(FetchStage, String),

    /// No server profile or credentials; the host must redirect to setup
    #[error("No server session configured: {0}")]
    MissingSession(String),

    /// Listings were never fetched; the host must redirect to refresh
    #[error("Cached listings not found: {0}")]
    MissingListings(String),

    /// The persisted key-value store could not be read or written
    #[error("Store error: {0}")]
    Store(String),

    /// Provider response could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl IptvError {
    /// Whether the host must leave the current screen (login/refresh)
    pub fn is_redirect(&self) -> bool {
        matches!(
            self,
            IptvError::MissingSession(_) | IptvError::MissingListings(_)
        )
    }

    /// Multi-line diagnostic text for the CLI `--check` output
    pub fn diagnostics(&self) -> String {
        match self {
            IptvError::Network(stage, source) => {
                format!("Network Error\nStage: {}\nError: {}\nSuggestion: Try again later", stage, source)
            }
            IptvError::MissingSession(reason) => {
                format!("Missing Session\nReason: {}\nSuggestion: Add a server profile to config.json", reason)
            }
            IptvError::MissingListings(which) => {
                format!("Missing Listings\nListing: {}\nSuggestion: Run with --refresh", which)
            }
            IptvError::Store(source) => {
                format!("Store Error\nError: {}\nSuggestion: Check permissions of the data directory", source)
            }
            IptvError::Parse(source) => {
                format!("Parse Error\nError: {}\nSuggestion: Provider response is invalid", source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_errors_are_flagged() {
        assert!(IptvError::MissingSession("no server".into()).is_redirect());
        assert!(IptvError::MissingListings("tv_streams".into()).is_redirect());
        assert!(!IptvError::Network(FetchStage::Epg, "timeout".into()).is_redirect());
    }

    #[test]
    fn network_error_names_stage() {
        let err = IptvError::Network(FetchStage::MovieInfo, "503".into());
        assert_eq!(err.to_string(), "Movie Info request failed: 503");
    }
}
