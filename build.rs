fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only the device build needs the ESP-IDF environment exported.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
