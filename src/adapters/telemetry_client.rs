//! Remote telemetry uplink.
//!
//! Implements [`TelemetryPort`] as one HTTP GET per push, with every
//! reading carried in the query string.  The receiver is an external
//! logging sheet; the device only cares whether the status was a
//! success.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the certificate
//!   bundle attached (the usual receivers are HTTPS).
//! - **all other targets**: the URL is recorded and a scripted status is
//!   returned, for host-side tests.

use core::fmt::Write as _;

use log::debug;

use crate::app::events::TelemetryRecord;
use crate::app::ports::TelemetryPort;
use crate::error::CommsError;

use super::labels::battery_state_label;
use super::wifi::ConnectivityPort;

/// Capacity of the request URL buffer.
pub const MAX_URL_LEN: usize = 512;

/// Wire value for a temperature that could not be read.
pub const INVALID_TEMPERATURE_SENTINEL: f32 = -127.0;

#[cfg(target_os = "espidf")]
const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Build the full GET URL for one telemetry record.
///
/// Appends to an existing query string when the endpoint already has
/// one (Apps Script deployments usually do not, webhook relays often do).
pub fn build_query_url(
    endpoint: &str,
    t: &TelemetryRecord,
) -> Result<heapless::String<MAX_URL_LEN>, CommsError> {
    if endpoint.is_empty() {
        return Err(CommsError::EndpointNotConfigured);
    }

    let sep = if endpoint.contains('?') { '&' } else { '?' };
    let temperature = t.temperature_c.unwrap_or(INVALID_TEMPERATURE_SENTINEL);

    let mut url = heapless::String::new();
    write!(
        url,
        "{endpoint}{sep}voltage={:.2}&current={:.2}&temperature={:.2}&soc={:.1}&soh={:.1}\
         &alert={}&ampHours={:.4}&fanStatus={}&chargingStatus={}&batteryState={}",
        t.voltage_v,
        t.current_a,
        temperature,
        t.soc_pct,
        t.soh_pct,
        t.alert.code(),
        t.amp_hours,
        u8::from(t.fan_on),
        u8::from(t.charging_enabled),
        battery_state_label(t.battery_state),
    )
    .map_err(|_| CommsError::UrlTooLong)?;
    Ok(url)
}

/// `2xx` and `3xx` count as delivered.
pub fn status_is_success(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Telemetry uplink over a station-mode link.
pub struct TelemetryClient<C> {
    link: C,
    endpoint: heapless::String<128>,
    #[cfg(not(target_os = "espidf"))]
    sim_status: u16,
    #[cfg(not(target_os = "espidf"))]
    sim_last_url: Option<heapless::String<MAX_URL_LEN>>,
}

impl<C: ConnectivityPort> TelemetryClient<C> {
    pub fn new(link: C, endpoint: &str) -> Self {
        let mut ep = heapless::String::new();
        if ep.push_str(endpoint).is_err() {
            log::warn!("TELEM: endpoint longer than 128 bytes, uplink disabled");
            ep.clear();
        }
        Self {
            link,
            endpoint: ep,
            #[cfg(not(target_os = "espidf"))]
            sim_status: 200,
            #[cfg(not(target_os = "espidf"))]
            sim_last_url: None,
        }
    }

    /// Point later pushes at a new endpoint after a config reload.
    pub fn set_endpoint(&mut self, endpoint: &heapless::String<128>) {
        self.endpoint = endpoint.clone();
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_get(&mut self, url: &str) -> Result<u16, CommsError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let config = Configuration {
            timeout: Some(core::time::Duration::from_millis(REQUEST_TIMEOUT_MS)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|e| {
            log::warn!("TELEM(espidf): client init failed: {:?}", e);
            CommsError::RequestFailed
        })?;
        conn.initiate_request(Method::Get, url, &[]).map_err(|e| {
            log::warn!("TELEM(espidf): request failed: {:?}", e);
            CommsError::RequestFailed
        })?;
        conn.initiate_response().map_err(|e| {
            log::warn!("TELEM(espidf): no response: {:?}", e);
            CommsError::RequestFailed
        })?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_get(&mut self, url: &str) -> Result<u16, CommsError> {
        let mut recorded = heapless::String::new();
        recorded.push_str(url).map_err(|_| CommsError::UrlTooLong)?;
        self.sim_last_url = Some(recorded);
        Ok(self.sim_status)
    }

    /// Simulation: status code returned by the next pushes.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_status(&mut self, status: u16) {
        self.sim_status = status;
    }

    /// Simulation: URL of the most recent request.
    #[cfg(not(target_os = "espidf"))]
    pub fn last_url(&self) -> Option<&str> {
        self.sim_last_url.as_deref()
    }
}

impl<C: ConnectivityPort> TelemetryPort for TelemetryClient<C> {
    fn push(&mut self, record: &TelemetryRecord) -> Result<(), CommsError> {
        let url = build_query_url(&self.endpoint, record)?;
        if !self.link.ensure_connected() {
            return Err(CommsError::NotConnected);
        }
        let status = self.platform_get(&url)?;
        debug!("TELEM: GET -> {}", status);
        if status_is_success(status) {
            Ok(())
        } else {
            Err(CommsError::HttpStatus(status))
        }
    }
}
