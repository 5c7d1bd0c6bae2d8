use common::configuration::UrlMatchMode;
use tracing::{debug, warn};
use url::Url;

use super::{trim_url, url_regex, OutputStage, RegenerationRequest, StageError};

const STAGE_NAME: &str = "url_validation";

#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedOrigin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

/// Origins the agent is allowed to link to
#[derive(Debug, Clone)]
pub struct UrlAllowlist {
    entries: Vec<String>,
    origins: Vec<AllowedOrigin>,
    mode: UrlMatchMode,
}

impl UrlAllowlist {
    /// A trailing `/` on an entry is dropped; the root path is implied.
    pub fn new(entries: &[String], mode: UrlMatchMode) -> Self {
        let entries: Vec<String> = entries
            .iter()
            .map(|entry| entry.trim_end_matches('/').to_string())
            .collect();
        let origins = entries
            .iter()
            .filter_map(|entry| match Url::parse(entry) {
                Ok(url) => url.host_str().map(|host| AllowedOrigin {
                    scheme: url.scheme().to_string(),
                    host: host.to_string(),
                    port: url.port_or_known_default(),
                }),
                Err(e) => {
                    warn!(entry = %entry, error = %e, "ignoring unparseable allowlist entry");
                    None
                }
            })
            .collect();

        Self {
            entries,
            origins,
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// A URL that does not parse is never allowed.
    pub fn is_allowed(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };

        match self.mode {
            UrlMatchMode::Origin => self.origins.iter().any(|origin| {
                origin.scheme == url.scheme()
                    && origin.port == url.port_or_known_default()
                    && (host == origin.host || host.ends_with(&format!(".{}", origin.host)))
            }),
            UrlMatchMode::Substring => {
                let origin = format!("{}://{}", url.scheme(), url.authority());
                self.entries.iter().any(|entry| origin.contains(entry.as_str()))
            }
        }
    }
}

pub struct UrlValidationStage {
    allowlist: UrlAllowlist,
}

impl UrlValidationStage {
    pub fn new(allowlist: UrlAllowlist) -> Self {
        Self { allowlist }
    }
}

impl OutputStage for UrlValidationStage {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    fn apply(&self, text: &str) -> Result<String, StageError> {
        if self.allowlist.is_empty() {
            warn!("no url allowlist configured, skipping url validation");
            return Ok(text.to_string());
        }

        let urls: Vec<&str> = url_regex()?
            .find_iter(text)
            .map(|m| trim_url(m.as_str()))
            .collect();

        let invalid: Vec<&str> = urls
            .iter()
            .copied()
            .filter(|url| !self.allowlist.is_allowed(url))
            .collect();

        for url in &invalid {
            warn!(url = %url, allowlist = ?self.allowlist.entries(), "invalid url found");
        }

        if !invalid.is_empty() {
            return Err(StageError::Regenerate(RegenerationRequest::new(
                STAGE_NAME,
                format!(
                    "Found {} invalid URLs that are not in the allowlist. Please only include URLs from these domains: {}",
                    invalid.len(),
                    self.allowlist.entries().join(", ")
                ),
            )));
        }

        debug!(urls_found = urls.len(), "url validation passed");
        Ok(text.to_string())
    }
}
