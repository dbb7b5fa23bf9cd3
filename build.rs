fn main() {
    // ESP-IDF linker/env plumbing is only needed for device builds.
    // Host-target test builds (no `espidf` feature) skip it.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
