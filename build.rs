fn main() {
    // ESP-IDF link arguments and sysenv are only needed for the firmware
    // build; host tests compile without the toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
