//! Adapters — concrete implementations of the port traits and the other
//! platform-facing glue.
//!
//! | Adapter     | Implements       | Connects to              |
//! |-------------|------------------|--------------------------|
//! | `device_id` | —                | eFuse factory MAC        |
//! | `log_sink`  | EventSink        | Serial log output        |
//! | `portal`    | —                | Boot-time provisioning   |
//! | `time`      | —                | ESP32 system timer       |
//! | `wifi`      | ConnectivityPort | ESP-IDF WiFi STA         |

pub mod device_id;
pub mod log_sink;
pub mod portal;
pub mod time;
pub mod wifi;
