//! Client for the vMix web API.

use std::{net::Ipv6Addr, time::Duration};

use anyhow::{bail, Context as _, Result};
use reqwest::{Client, Url};

/// Port of the vMix web controller when the address does not name one
const DEFAULT_PORT: u16 = 8088;
/// Upper bound for any single request, so a stalled device cannot delay the next tick.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// A named vMix function with its query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    function: String,
    params: Vec<(&'static str, String)>,
}

impl Command {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn set_text(input: &str, field: &str, value: &str) -> Self {
        Self::new("SetText")
            .param("Input", input)
            .param("SelectedName", field)
            .param("Value", value)
    }

    pub fn set_image(input: &str, field: &str, path: &str) -> Self {
        Self::new("SetImage")
            .param("Input", input)
            .param("SelectedName", field)
            .param("Value", path)
    }

    /// Bring `input` on air through overlay `channel`
    pub fn overlay_in(channel: u8, input: &str) -> Self {
        Self::new(format!("OverlayInput{channel}In")).param("Input", input)
    }

    /// Take `input` off air from overlay `channel`
    pub fn overlay_out(channel: u8, input: &str) -> Self {
        Self::new(format!("OverlayInput{channel}Out")).param("Input", input)
    }

    pub fn set_overlay_transition(channel: u8, kind: &str) -> Self {
        Self::new("SetOverlayTransition")
            .param("Overlay", channel)
            .param("Value", kind)
    }

    pub fn set_overlay_transition_duration(channel: u8, millis: u32) -> Self {
        Self::new("SetOverlayTransitionDuration")
            .param("Overlay", channel)
            .param("Value", millis)
    }

    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Query string pairs, `Function` first.
    #[must_use]
    pub fn query(&self) -> Vec<(&str, &str)> {
        std::iter::once(("Function", self.function.as_str()))
            .chain(self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .collect()
    }
}

/// Build the API endpoint from an operator-supplied address.
///
/// Without a scheme the address is an HTTP host, optionally with a port (default 8088).
/// Bare IPv6 addresses are accepted without brackets.
///
/// # Errors
///
/// Returns an error if the address is empty or cannot be turned into a URL.
pub fn api_url(address: &str) -> Result<Url> {
    let address = address.trim();
    if address.is_empty() {
        bail!("vMix address is empty");
    }

    let url = if address.contains("://") {
        Url::parse(address)
    } else if address.parse::<Ipv6Addr>().is_ok() {
        Url::parse(&format!("http://[{address}]:{DEFAULT_PORT}"))
    } else {
        Url::parse(&format!("http://{address}")).map(|mut url| {
            if !has_explicit_port(address) {
                // Only fails for URLs without a host, rejected below
                let _ = url.set_port(Some(DEFAULT_PORT));
            }
            url
        })
    };
    let mut url = url.with_context(|| format!("Invalid vMix address {address}"))?;
    if url.cannot_be_a_base() || url.host().is_none() {
        bail!("Invalid vMix address {address}");
    }
    if url.path() == "/" {
        url.set_path("/api/");
    }
    Ok(url)
}

/// Whether a scheme-less `host[:port][/path]` names a port, including one equal to the
/// scheme default which [`Url::port`] hides.
fn has_explicit_port(address: &str) -> bool {
    let authority = address.split('/').next().unwrap_or(address);
    authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

/// Connection to one vMix instance.
#[derive(Clone, Debug)]
pub struct VmixClient {
    url: Url,
    client: Client,
}

impl VmixClient {
    /// Create a client for the API endpoint at `url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(url: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { url, client })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch the XML status document
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure, timeout, or a non-success HTTP status.
    pub async fn fetch_status(&self) -> Result<String> {
        self.client
            .get(self.url.clone())
            .send()
            .await
            .context("Failed to reach vMix")?
            .error_for_status()
            .context("vMix rejected the status request")?
            .text()
            .await
            .context("Failed to read vMix status")
    }

    /// Send a command without waiting for anything beyond the HTTP response.
    ///
    /// Failures are logged and reported as `false`; they are never retried.
    #[must_use]
    pub async fn send(&self, command: &Command) -> bool {
        let query = command.query();
        tracing::debug!(?query, "Sending vMix command");
        let result = async {
            self.client
                .get(self.url.clone())
                .query(&query)
                .send()
                .await?
                .error_for_status()
        }
        .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(function = command.function(), %e, "vMix command failed");
                false
            }
        }
    }
}
