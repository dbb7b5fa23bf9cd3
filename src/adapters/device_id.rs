//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable, human-readable device ID in the form `HL-XXYYZZ`
//! (last 3 bytes of the 6-byte MAC in uppercase hex).  This ID is:
//! - Deterministic across reboots (factory-burned eFuse MAC)
//! - The device field of every outbound color token (it must contain no
//!   dots — the token wire format is dot-separated)
//! - Used as the mDNS-style hostname (`halolamp-xxyyzz`)

/// Fixed-size device ID string: "HL-XXYYZZ".
pub type DeviceIdString = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x48, 0x41, 0x4C, 0x4F, 0xCA, 0xFE]
}

/// Derive the short device ID from the last 3 MAC bytes.
/// Format: `HL-XXYYZZ` (e.g., `HL-4FCAFE`).
pub fn device_id(mac: &MacAddress) -> DeviceIdString {
    let mut id = DeviceIdString::new();
    use core::fmt::Write;
    let _ = write!(id, "HL-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}

/// Derive the hostname from the last 3 MAC bytes.
/// Format: `halolamp-xxyyzz` (lowercase).
pub fn hostname(mac: &MacAddress) -> heapless::String<24> {
    let mut name = heapless::String::<24>::new();
    use core::fmt::Write;
    let _ = write!(name, "halolamp-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    name
}
