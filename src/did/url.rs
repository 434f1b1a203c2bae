//! Destructure DID URIs into strongly typed components.
//!
//! A DID URL is of the form
//!
//! `did:<method>:<method-specific-id>[;<param>=<value>][/<path>][?<query>][#<fragment>]`.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Err;
use crate::{tracerr, Result};

static DID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        concat!(
            r"^did:(?<method>[a-z0-9]+):(?<id>[^;/?#]+)",
            r"(?<params>(?:;[a-zA-Z0-9_.:%-]+=[a-zA-Z0-9_.:%-]*)*)",
            r"(?<path>/[^#?]*)?(?:\?(?<query>[^#]*))?(?:#(?<fragment>.*))?$",
        ),
    )
    .expect("should compile")
});

/// A parsed DID or DID URL.
///
/// Parsing is pure: it never mutates the input and reports malformed input by
/// returning `None` from [`Did::parse`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Did {
    /// The DID without any parameters, path, query or fragment:
    /// `did:<method>:<method-specific-id>`.
    pub uri: String,

    /// The complete DID URL as parsed.
    pub url: String,

    /// DID method name.
    pub method: String,

    /// Method-specific ID. Validating its content is left to the method.
    pub id: String,

    /// DID parameters (`;name=value`), if any.
    pub params: Option<BTreeMap<String, String>>,

    /// Path, including the leading `/`.
    pub path: Option<String>,

    /// Query, excluding the leading `?`.
    pub query: Option<String>,

    /// Fragment, excluding the leading `#`.
    pub fragment: Option<String>,
}

impl Did {
    /// Parse a DID or DID URL, returning `None` if the input is not of the
    /// form `did:<method>:<method-specific-id>` with a lowercase alphanumeric
    /// method name and a non-empty method-specific id.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let caps = DID_REGEX.captures(url)?;
        let method = caps["method"].to_string();
        let id = caps["id"].to_string();

        let params = caps.name("params").map(|m| m.as_str()).filter(|p| !p.is_empty()).map(|p| {
            p.split(';')
                .filter_map(|kv| kv.split_once('='))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        });

        Some(Self {
            uri: format!("did:{method}:{id}"),
            url: url.to_string(),
            method,
            id,
            params,
            path: caps.name("path").map(|m| m.as_str().to_string()),
            query: caps.name("query").map(|m| m.as_str().to_string()),
            fragment: caps.name("fragment").map(|m| m.as_str().to_string()),
        })
    }

    /// The DID joined with the fragment, if any: `did:<method>:<id>#<fragment>`.
    ///
    /// This is the form verification method and service IDs take inside a DID
    /// document.
    #[must_use]
    pub fn resource_id(&self) -> String {
        self.fragment.as_ref().map_or_else(|| self.uri.clone(), |f| format!("{}#{f}", self.uri))
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for Did {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some(did) = Self::parse(s) else {
            tracerr!(Err::InvalidDid, "invalid DID: {s}");
        };
        Ok(did)
    }
}
