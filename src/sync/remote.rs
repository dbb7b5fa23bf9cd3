//! Periodic round trip against the coordination service.
//!
//! The network task calls [`SyncWorker::poll_once`] on a fixed period.
//! If a local change is pending it is reported with `?fc=<token>`;
//! otherwise the device just asks for the current token with
//! `?id=<deviceId>`.  Either way the service answers with a JSON body
//! `{"fc": "<colorIndex>.<nonce>.<deviceId>"}` carrying the network's
//! current token, which is published to the inbound slot.
//!
//! Every failure mode — transport error, non-2xx status, empty body,
//! malformed JSON, unparseable token — is logged and otherwise ignored:
//! the pending flag and the inbound slot keep their previous values and
//! the next period retries unconditionally.  The device has no other
//! recourse, so there is no backoff and no retry cap.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::CommsError;

use super::channel::SyncChannel;
use super::token::ColorToken;

/// Blocking HTTP GET boundary.  The production implementation wraps the
/// ESP-IDF HTTP client; tests script responses.
pub trait SyncTransport {
    /// Perform the request and return the response body on HTTP 2xx.
    fn exchange(&mut self, url: &str) -> Result<String, CommsError>;
}

/// Shape of the service's response body.
#[derive(Debug, Deserialize)]
struct SyncReply {
    fc: String,
}

pub struct SyncWorker<T: SyncTransport> {
    transport: T,
    channel: Arc<SyncChannel>,
    device_id: String,
    service_url: String,
}

impl<T: SyncTransport> SyncWorker<T> {
    pub fn new(
        transport: T,
        channel: Arc<SyncChannel>,
        device_id: &str,
        service_url: &str,
    ) -> Self {
        Self {
            transport,
            channel,
            device_id: device_id.to_owned(),
            service_url: service_url.to_owned(),
        }
    }

    /// The underlying transport (tests inspect recorded requests).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One full round trip.  Called once per sync period.
    pub fn poll_once(&mut self) {
        let pending = self.channel.pending_outbound();
        let url = match &pending {
            Some(ticket) => format!("{}?fc={}", self.service_url, ticket.token().encode()),
            None => format!("{}?id={}", self.service_url, self.device_id),
        };

        match self.round_trip(&url) {
            Ok(remote) => {
                if let Some(ticket) = pending {
                    info!("sync: reported {}", ticket.token());
                    self.channel.ack_outbound(&ticket);
                } else {
                    debug!("sync: fetched {}", remote);
                }
                self.channel.set_inbound(remote);
            }
            Err(e) => {
                warn!("sync: round trip failed ({e}), retrying next period");
            }
        }
    }

    fn round_trip(&mut self, url: &str) -> Result<ColorToken, CommsError> {
        let body = self.transport.exchange(url)?;
        if body.is_empty() {
            return Err(CommsError::EmptyBody);
        }
        let reply: SyncReply =
            serde_json::from_str(&body).map_err(|_| CommsError::MalformedPayload)?;
        ColorToken::parse(&reply.fc).map_err(|_| CommsError::MalformedPayload)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp_transport::EspHttpTransport;

#[cfg(target_os = "espidf")]
mod esp_transport {
    use embedded_svc::http::client::Client as HttpClient;
    use embedded_svc::http::{Method, Status};
    use embedded_svc::io::Read;
    use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};

    use crate::error::CommsError;

    use super::SyncTransport;

    /// Largest response body the worker will accept.
    const MAX_BODY_BYTES: usize = 512;

    pub struct EspHttpTransport {
        timeout: core::time::Duration,
    }

    impl EspHttpTransport {
        pub fn new(timeout_secs: u64) -> Self {
            Self {
                timeout: core::time::Duration::from_secs(timeout_secs),
            }
        }
    }

    impl SyncTransport for EspHttpTransport {
        fn exchange(&mut self, url: &str) -> Result<String, CommsError> {
            let conf = HttpClientConfiguration {
                timeout: Some(self.timeout),
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                ..Default::default()
            };
            let conn =
                EspHttpConnection::new(&conf).map_err(|_| CommsError::HttpRequestFailed)?;
            let mut client = HttpClient::wrap(conn);

            let request = client
                .request(Method::Get, url, &[])
                .map_err(|_| CommsError::HttpRequestFailed)?;
            let mut response = request.submit().map_err(|_| CommsError::HttpRequestFailed)?;

            let status = response.status();
            if !(200..300).contains(&status) {
                return Err(CommsError::HttpStatus(status));
            }

            let mut body = Vec::new();
            let mut chunk = [0u8; 128];
            loop {
                let read = response
                    .read(&mut chunk)
                    .map_err(|_| CommsError::HttpRequestFailed)?;
                if read == 0 {
                    break;
                }
                if body.len() + read > MAX_BODY_BYTES {
                    return Err(CommsError::MalformedPayload);
                }
                body.extend_from_slice(&chunk[..read]);
            }

            String::from_utf8(body).map_err(|_| CommsError::MalformedPayload)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation transport
// ───────────────────────────────────────────────────────────────

/// Stand-in transport for host builds: every exchange fails, which
/// exercises the retry-forever path without a network stack.
#[cfg(not(target_os = "espidf"))]
pub struct SimTransport;

#[cfg(not(target_os = "espidf"))]
impl SyncTransport for SimTransport {
    fn exchange(&mut self, url: &str) -> Result<String, CommsError> {
        debug!("sync(sim): would GET {url}");
        Err(CommsError::HttpRequestFailed)
    }
}
