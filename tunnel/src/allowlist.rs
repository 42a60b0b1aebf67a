use crate::dsn::Dsn;
use crate::errors::{Result, TunnelError};
use serde::Deserialize;
use std::collections::HashSet;

/// The single host and set of project ids a DSN must name to be forwarded.
///
/// Matching is exact: the host is compared with the DSN host as written, so
/// there is no case folding, percent-decoding, trimming or prefix matching.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AllowList {
    #[serde(rename = "sentry_host")]
    pub host: String,
    #[serde(rename = "sentry_project_ids")]
    pub project_ids: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(host: impl Into<String>, project_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            host: host.into(),
            project_ids: project_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.host == host
    }

    pub fn is_project_allowed(&self, project_id: &str) -> bool {
        self.project_ids.contains(project_id)
    }

    /// Checks the DSN's host, then its project id, and returns the project id.
    pub fn authorize<'a>(&self, dsn: &'a Dsn) -> Result<&'a str> {
        let hostname = dsn.hostname();
        if !self.is_host_allowed(hostname) {
            return Err(TunnelError::HostNotAllowed(hostname.to_string()));
        }

        let project_id = dsn.project_id();
        if !self.is_project_allowed(project_id) {
            return Err(TunnelError::ProjectNotAllowed(project_id.to_string()));
        }

        Ok(project_id)
    }
}

/// Parses a comma separated list of project ids, skipping blank entries.
pub fn parse_project_ids(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
