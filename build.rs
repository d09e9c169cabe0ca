//! Build script for the RSSI meter firmware
//!
//! Adds the manifest directory to the linker search path so a board-local
//! `memory.x` can override the one generated by embassy-stm32.

fn main() {
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(dir) = std::env::var("CARGO_MANIFEST_DIR") {
        println!("cargo:rustc-link-search={dir}");
    }
}
