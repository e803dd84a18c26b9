//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter            | Implements         | Connects to                 |
//! |--------------------|--------------------|-----------------------------|
//! | `hardware`         | SensorPort         | ESP32 ADC1                  |
//! |                    | ActuatorPort       | LEDC fan PWM, relay GPIO    |
//! | `log_sink`         | EventSink          | Serial log output           |
//! | `nvs`              | ConfigPort         | NVS / in-memory store       |
//! | `telemetry_client` | TelemetryPort      | HTTP(S) GET to a collector  |
//! | `time`             |                    | ESP32 system timer          |
//! | `wifi`             | ConnectivityPort   | ESP-IDF WiFi STA            |
//! | `http_server`      |                    | Local dashboard and relay   |
//!
//! `labels` holds the display strings shared by the text-producing adapters.

pub mod hardware;
pub mod http_server;
pub mod labels;
pub mod log_sink;
pub mod nvs;
pub mod telemetry_client;
pub mod time;
pub mod wifi;
