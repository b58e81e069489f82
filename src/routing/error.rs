//! Fatal proxy configuration errors.

use thiserror::Error;

/// A mistake in the `proxy` configuration. Always fatal at startup.
#[derive(Debug, Error)]
pub enum RouteConfigError {
    /// The proxy value is neither a string nor a table.
    #[error(
        "When specified, \"proxy\" must be a string or a table. \
         Instead, the type of \"proxy\" was \"{found}\". \
         Either remove \"proxy\" from the configuration, or make it a string or a table."
    )]
    InvalidType { found: &'static str },

    /// A table entry maps a context to something other than a URL string.
    #[error("The \"proxy\" entry for context \"{context}\" must be a string, found \"{found}\".")]
    InvalidTargetType {
        context: String,
        found: &'static str,
    },

    /// The target does not use an HTTP scheme.
    #[error(
        "When \"proxy\" is specified it must start with either http:// or https:// (got \"{target}\")."
    )]
    InvalidScheme { target: String },

    /// The target starts with an HTTP scheme but is not a valid URL.
    #[error("Invalid \"proxy\" target \"{target}\": {source}")]
    InvalidUrl {
        target: String,
        #[source]
        source: url::ParseError,
    },
}
