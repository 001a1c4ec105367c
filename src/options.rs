//! Contains the options for a smoke test run.

use std::time::Duration;

use mongodb::options::ClientOptions;
use typed_builder::TypedBuilder;

use crate::{
    error::{Error, Result},
    smoke::Sequence,
};

/// The deployment targeted when no URI is given.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017/";

/// The database the smoke test writes to.
pub const DEFAULT_DATABASE: &str = "carDB";

/// The collection the smoke test writes to.
pub const DEFAULT_COLLECTION: &str = "car";

/// Reported to the server in the connection handshake.
pub const DEFAULT_APP_NAME: &str = "mongodb-smoke";

const TIMEOUT_MS: &str = "timeoutMS";

/// How the update, verify and delete steps locate the inserted car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MatchBy {
    /// Match on `{name: ...}`. Another car with the same name may be matched instead of the one
    /// just inserted.
    #[default]
    Content,

    /// Match on the `_id` returned by the insert.
    Id,
}

/// A connection string with the options handled by this crate removed.
///
/// The driver rejects `timeoutMS`, so it is extracted here and applied as the server selection
/// timeout, the connect timeout, and the per-step ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUri {
    /// The connection string to hand to the driver.
    pub uri: String,

    /// The value of `timeoutMS`, if present and non-zero.
    pub timeout: Option<Duration>,
}

impl ParsedUri {
    /// Splits `timeoutMS` out of `uri`. The option name is matched case-insensitively and `0`
    /// means no ceiling.
    pub fn parse(uri: &str) -> Result<Self> {
        let Some((base, query)) = uri.split_once('?') else {
            return Ok(Self {
                uri: uri.to_string(),
                timeout: None,
            });
        };

        let mut kept = Vec::new();
        let mut timeout = None;
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) if key.eq_ignore_ascii_case(TIMEOUT_MS) => {
                    let millis: u64 = value.parse().map_err(|_| {
                        Error::invalid_config(format!(
                            "connection string `{key}` option must be a non-negative integer, \
                             got {value:?}"
                        ))
                    })?;
                    timeout = Some(Duration::from_millis(millis)).filter(|t| !t.is_zero());
                }
                _ => kept.push(pair),
            }
        }

        let uri = if kept.is_empty() {
            base.to_string()
        } else {
            format!("{}?{}", base, kept.join("&"))
        };
        Ok(Self { uri, timeout })
    }
}

/// Specifies the options for a smoke test run.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(field_defaults(default))]
#[non_exhaustive]
pub struct SmokeOptions {
    /// The connection string. May carry `timeoutMS`.
    #[builder(default = DEFAULT_URI.to_string(), setter(into))]
    pub uri: String,

    /// Overrides any `timeoutMS` in the URI. A zero duration disables the ceiling.
    pub timeout: Option<Duration>,

    #[builder(default = DEFAULT_DATABASE.to_string(), setter(into))]
    pub database: String,

    #[builder(default = DEFAULT_COLLECTION.to_string(), setter(into))]
    pub collection: String,

    #[builder(default = DEFAULT_APP_NAME.to_string(), setter(into))]
    pub app_name: String,

    pub match_by: MatchBy,

    /// Re-read after the update to observe the new name.
    pub verify_update: bool,

    /// Drop the collection before inserting.
    pub drop_first: bool,
}

impl Default for SmokeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl SmokeOptions {
    /// The ceiling applied to connecting and to each step, if any.
    pub fn operation_timeout(&self) -> Result<Option<Duration>> {
        let parsed = ParsedUri::parse(&self.uri)?;
        Ok(self.timeout.or(parsed.timeout).filter(|t| !t.is_zero()))
    }

    /// Builds the driver options: the URI without `timeoutMS`, with the ceiling applied to
    /// server selection and connection establishment.
    pub async fn client_options(&self) -> Result<ClientOptions> {
        let parsed = ParsedUri::parse(&self.uri)?;
        let timeout = self.operation_timeout()?;

        let mut options = ClientOptions::parse(parsed.uri.as_str()).await?;
        if options.app_name.is_none() {
            options.app_name = Some(self.app_name.clone());
        }
        if let Some(timeout) = timeout {
            options.server_selection_timeout = Some(timeout);
            options.connect_timeout = Some(timeout);
        }
        Ok(options)
    }

    /// The step sequence these options describe.
    pub fn sequence(&self) -> Result<Sequence> {
        Ok(Sequence::builder()
            .match_by(self.match_by)
            .verify_update(self.verify_update)
            .timeout(self.operation_timeout()?)
            .build())
    }
}
