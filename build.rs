fn main() {
    // Host builds (`--no-default-features`) have no ESP-IDF toolchain to
    // export; only the device build needs the linker environment.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
