//! Extraction of the destination DSN from an envelope's header record.

use crate::errors::{Result, TunnelError};
use serde::Deserialize;
use url::Url;

/// First line of an envelope. Only `dsn` is read, other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct HeaderRecord {
    pub dsn: String,
}

impl HeaderRecord {
    pub fn from_envelope(envelope: &[u8]) -> Result<Self> {
        serde_json::from_slice(first_line(envelope)).map_err(TunnelError::Deserialize)
    }
}

/// Bytes up to, not including, the first newline.
pub fn first_line(envelope: &[u8]) -> &[u8] {
    envelope
        .split(|byte| *byte == b'\n')
        .next()
        .unwrap_or(envelope)
}

/// A parsed `scheme://[credentials@]host/projectId` string.
#[derive(Debug, Clone)]
pub struct Dsn {
    url: Url,
    hostname: String,
}

impl Dsn {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(TunnelError::InvalidDsn)?;
        // `Url` lowercases and percent-decodes the host, so keep the written form
        let hostname = if url.has_host() {
            written_host(raw.trim()).to_string()
        } else {
            String::new()
        };

        Ok(Dsn { url, hostname })
    }

    /// Host as written in the DSN, without credentials or port.
    ///
    /// No case folding or percent-decoding is applied. IPv6 literals lose
    /// their brackets, a missing host is empty.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// URL path with a single trailing and a single leading slash removed.
    pub fn project_id(&self) -> &str {
        let path = self.url.path();
        let path = path.strip_suffix('/').unwrap_or(path);
        path.strip_prefix('/').unwrap_or(path)
    }
}

/// Host part of the authority exactly as it appears in `raw`.
fn written_host(raw: &str) -> &str {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '\\', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);

    match host_port.strip_prefix('[') {
        Some(literal) => literal.split(']').next().unwrap_or(literal),
        None => host_port.split(':').next().unwrap_or(host_port),
    }
}
