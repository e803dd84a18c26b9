//! WiFi station link for the telemetry uplink.
//!
//! The local HTTP endpoint only needs the netif to be up; the telemetry
//! push is the one caller that actively asks for the link, through
//! [`ConnectivityPort::ensure_connected`].
//!
//! On `espidf` the adapter drives an attached `BlockingWifi<EspWifi>`;
//! elsewhere it simulates an access point whose reachability tests can
//! toggle.
//!
//! There is no background reconnect task.  `ensure_connected` makes at
//! most one blocking attempt per call, so a dead AP costs the control loop
//! one connect timeout per telemetry period and nothing more.

use core::fmt;
use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use crate::error::CommsError;

const SSID_MAX: usize = 32;
const PSK_MIN: usize = 8;
const PSK_MAX: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    /// `connect` called before any credentials were stored.
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    /// Driver missing, association failed or DHCP never completed.
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => f.write_str("station credentials not set"),
            Self::InvalidSsid => write!(f, "SSID must be 1-{SSID_MAX} printable ASCII characters"),
            Self::InvalidPassword => {
                write!(f, "passphrase must be empty (open AP) or {PSK_MIN}-{PSK_MAX} bytes")
            }
            Self::ConnectionFailed => f.write_str("could not join access point"),
        }
    }
}

impl From<ConnectivityError> for CommsError {
    fn from(_: ConnectivityError) -> Self {
        Self::WifiConnectFailed
    }
}

/// Network link as seen by the uplink.
pub trait ConnectivityPort {
    /// Join the configured AP.  A no-op when already joined.
    fn connect(&mut self) -> Result<(), ConnectivityError>;
    fn is_connected(&self) -> bool;
    /// Make one attempt if the link is down; report whether it is up now.
    fn ensure_connected(&mut self) -> bool;
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

/// Validated station credentials.
#[derive(Debug, Clone, Default)]
struct Credentials {
    ssid: heapless::String<SSID_MAX>,
    password: heapless::String<PSK_MAX>,
}

impl Credentials {
    fn parse(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !ssid.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && !(PSK_MIN..=PSK_MAX).contains(&password.len()) {
            return Err(ConnectivityError::InvalidPassword);
        }
        let mut c = Self::default();
        c.ssid.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        c.password
            .push_str(password)
            .map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok(c)
    }

    fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Down,
    Up,
    /// Lost or never established; `failures` consecutive attempts failed.
    Retrying { failures: u32 },
}

pub struct WifiAdapter {
    link: LinkState,
    creds: Option<Credentials>,
    #[cfg(target_os = "espidf")]
    driver: Option<BlockingWifi<EspWifi<'static>>>,
    #[cfg(not(target_os = "espidf"))]
    sim_reachable: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_attempts: u32,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            link: LinkState::Down,
            creds: None,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_reachable: true,
            #[cfg(not(target_os = "espidf"))]
            sim_attempts: 0,
        }
    }

    /// Hand over the station driver built from the modem peripheral.
    #[cfg(target_os = "espidf")]
    pub fn attach(&mut self, driver: BlockingWifi<EspWifi<'static>>) {
        self.driver = Some(driver);
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    #[cfg(target_os = "espidf")]
    fn join(&mut self, creds: &Credentials) -> Result<(), ConnectivityError> {
        let wifi = self.driver.as_mut().ok_or(ConnectivityError::ConnectionFailed)?;
        let client = ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidSsid)?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if creds.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };
        let step = |what: &str, r: Result<(), esp_idf_svc::sys::EspError>| {
            r.map_err(|e| {
                warn!("WiFi: {} failed: {:?}", what, e);
                ConnectivityError::ConnectionFailed
            })
        };

        step("set_configuration", wifi.set_configuration(&Configuration::Client(client)))?;
        if !wifi.is_started().unwrap_or(false) {
            step("start", wifi.start())?;
        }
        step("connect", wifi.connect())?;
        step("DHCP", wifi.wait_netif_up())
    }

    #[cfg(not(target_os = "espidf"))]
    fn join(&mut self, creds: &Credentials) -> Result<(), ConnectivityError> {
        self.sim_attempts += 1;
        if self.sim_reachable {
            info!("WiFi(sim): joined '{}' ({} auth)", creds.ssid, if creds.is_open() { "open" } else { "wpa2" });
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn link_up(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|w| w.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn link_up(&self) -> bool {
        self.link == LinkState::Up
    }

    /// Simulation: AP reachability.  Going unreachable drops the link.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_reachable(&mut self, reachable: bool) {
        self.sim_reachable = reachable;
        if !reachable && self.link == LinkState::Up {
            self.link = LinkState::Retrying { failures: 0 };
        }
    }

    /// Simulation: join attempts made so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect_attempts(&self) -> u32 {
        self.sim_attempts
    }
}

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        let creds = self.creds.clone().ok_or(ConnectivityError::NoCredentials)?;
        if self.link == LinkState::Up && self.link_up() {
            return Ok(());
        }

        let failures = match self.link {
            LinkState::Retrying { failures } => failures,
            _ => 0,
        };
        info!("WiFi: joining '{}'", creds.ssid);
        match self.join(&creds) {
            Ok(()) => {
                self.link = LinkState::Up;
                info!("WiFi: link up");
                Ok(())
            }
            Err(e) => {
                self.link = LinkState::Retrying { failures: failures + 1 };
                warn!("WiFi: {} ({} consecutive)", e, failures + 1);
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.link_up()
    }

    fn ensure_connected(&mut self) -> bool {
        if self.link_up() {
            return true;
        }
        if self.link == LinkState::Up {
            warn!("WiFi: link lost");
            self.link = LinkState::Retrying { failures: 0 };
        }
        self.connect().is_ok()
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        let creds = Credentials::parse(ssid, password)?;
        info!("WiFi: station SSID set to '{}'", creds.ssid);
        self.creds = Some(creds);
        Ok(())
    }
}
