use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn grafika(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grafika"))
        .env("GRAFIKA_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run grafika")
}

#[test]
fn config_prints_defaults_without_a_file() {
    let root = TempDir::new().unwrap();
    let output = grafika(root.path(), &["config"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("width = 1000"), "stdout:\n{stdout}");
    assert!(stdout.contains("height = 800"));
    assert!(stdout.contains("title = \"Computer Graphics\""));
    assert!(stdout.contains("a = \"texture1.jpg\""));
    assert!(stdout.contains("initial_mode = 1"));
}

#[test]
fn config_layers_file_then_flags() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[window]\ntitle = \"From File\"\nwidth = 640\n\n[render]\ngeometry = \"transient\"\n",
    )
    .unwrap();

    let output = grafika(root.path(), &["config", "--size", "320x240", "--mode", "3"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("title = \"From File\""), "stdout:\n{stdout}");
    assert!(stdout.contains("width = 320"));
    assert!(stdout.contains("height = 240"));
    assert!(stdout.contains("geometry = \"transient\""));
    assert!(stdout.contains("initial_mode = 3"));
}

#[test]
fn missing_explicit_config_fails() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("absent.toml");
    let output = grafika(root.path(), &["config", "--config", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("absent.toml"), "stderr:\n{stderr}");
}

#[test]
fn invalid_config_value_fails() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[render]\ninitial_mode = 7\n",
    )
    .unwrap();

    let output = grafika(root.path(), &["config"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("initial_mode"), "stderr:\n{stderr}");
}

#[test]
fn check_shaders_accepts_builtin_program() {
    let root = TempDir::new().unwrap();
    let output = grafika(root.path(), &["check-shaders"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("compiled and linked"));
}

#[test]
fn check_shaders_reports_broken_fragment_shader() {
    let root = TempDir::new().unwrap();
    let fragment = root.path().join("broken.frag");
    fs::write(
        &fragment,
        "#version 450\nlayout(location = 0) out vec4 color;\nvoid main() {\n    color = vec4(1.0\n}\n",
    )
    .unwrap();

    let output = grafika(
        root.path(),
        &["check-shaders", "--fragment-shader", fragment.to_str().unwrap()],
    );
    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("fragment shader compilation failed"), "stdout:\n{stdout}");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("shader check failed"), "stderr:\n{stderr}");
    assert!(!stderr.contains("fragment shader compilation failed"), "stderr:\n{stderr}");
}
