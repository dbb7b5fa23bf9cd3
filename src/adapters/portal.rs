//! Boot-time provisioning gate.
//!
//! If the touch sensor reads positive at power-on, the lamp blocks in a
//! network-configuration mode before entering normal operation.  The
//! captive portal itself (SoftAP + config page) is an external
//! collaborator; this module owns only the gate decision and the blocking
//! wait for credentials.  This is the single place where normal
//! scheduling is intentionally suspended — it is operator-invoked, never
//! error-triggered.

use log::info;

use crate::adapters::wifi::WifiAdapter;
use crate::drivers::touch::TouchSensor;

/// Whether the operator is requesting provisioning: touch held at
/// power-on.
pub fn provisioning_requested(touch: &TouchSensor) -> bool {
    touch.sample_debounced()
}

/// Block until the adapter has usable credentials.
///
/// On ESP-IDF this parks the boot thread while the captive portal runs
/// and feeds credentials into the adapter; on the host it returns as soon
/// as credentials are present (tests preload them).
pub fn run_blocking(wifi: &mut WifiAdapter) {
    info!("provisioning: entered (startup is paused until configured)");
    while !wifi.has_credentials() {
        #[cfg(target_os = "espidf")]
        {
            // Portal hand-off: the captive portal task calls
            // wifi.set_credentials() when the operator submits the form.
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(250);
        }
        #[cfg(not(target_os = "espidf"))]
        {
            break;
        }
    }
    info!("provisioning: exited");
}
