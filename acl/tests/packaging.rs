use std::{fs, path::PathBuf};

use pretty_assertions::assert_eq;

fn workspace_file(name: &str) -> String {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let path = root.parent().unwrap().join(name);

    fs::read_to_string(&path).unwrap_or_else(|error| panic!("reading {}: {error}", path.display()))
}

fn rust_version() -> String {
    let manifest: toml::Table = workspace_file("Cargo.toml").parse().unwrap();

    manifest["workspace"]["package"]["rust-version"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn image_builds_with_the_declared_toolchain() {
    let dockerfile = workspace_file("Dockerfile");
    let image = dockerfile
        .lines()
        .find_map(|line| line.strip_prefix("FROM "))
        .unwrap();

    assert_eq!(image.trim(), format!("rust:{}-bookworm", rust_version()));
}

#[test]
fn image_resolves_for_the_declared_toolchain() {
    let config: toml::Table = workspace_file(".cargo/config.toml").parse().unwrap();
    assert_eq!(
        config["resolver"]["incompatible-rust-versions"].as_str(),
        Some("fallback")
    );

    let dockerfile = workspace_file("Dockerfile");
    assert!(dockerfile.contains("COPY .cargo ./.cargo"));
    assert!(dockerfile.contains("COPY Cargo.toml Cargo.lock* ./"));
    assert!(dockerfile.contains("cargo build --release --locked --bin acl"));
}
