//! Bakes device paths into the binary.
//!
//! Values come from the environment or a `.env` file next to the workspace
//! (see `.env.example`); anything unset falls back to the usual device nodes.

const SETTINGS: [(&str, &str); 3] = [
    ("TACTILE_TOUCH_DEVICE", "/dev/input/event0"),
    ("TACTILE_FB_DEVICE", "/dev/fb0"),
    ("TACTILE_CONFIG_PATH", "/etc/tactile/engine.cfg"),
];

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo::rerun-if-changed={}", path.display());
    }

    for (key, default) in SETTINGS {
        println!("cargo::rerun-if-env-changed={key}");
        let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
        println!("cargo::rustc-env={key}={value}");
    }
}
