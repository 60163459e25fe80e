fn main() {
    // toml-cfg reads cfg.toml while compiling the config module
    println!("cargo:rerun-if-changed=cfg.toml");
}
