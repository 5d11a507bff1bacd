#![cfg(unix)]

mod common;

use common::{file_count, file_size, image, scenario_tools};
use space_image_optimizer::testing::failing_tool;
use space_image_optimizer::{BatchRunner, Config, JsonReport, Optimizer, OptimizeError, TextReport};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn isolated_config(tools: &Path) -> Config {
    Config {
        tools_dir: Some(tools.to_path_buf()),
        search_system_path: false,
        show_progress: false,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_scenario_png_and_gif() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    scenario_tools(tools.path());
    let png = image(images.path(), "a.png", 1000);
    let gif = image(images.path(), "b.gif", 2000);

    let runner = assert_ok!(BatchRunner::new(isolated_config(tools.path())));
    let totals = assert_ok!(runner.run(images.path(), &mut TextReport::new(Vec::new())).await);

    assert_eq!(file_size(&png), 750);
    assert!(std::fs::read(&png).unwrap().starts_with(b"pngcrush"));
    assert_eq!(file_size(&gif), 1800);
    assert_eq!(totals.size_before, 3000);
    assert_eq!(totals.size_after, 2550);
    assert_eq!(format!("{:.2}", totals.saved_percent()), "15.00");

    // no candidates or staging files left behind next to the originals
    assert_eq!(file_count(images.path()), 2);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    scenario_tools(tools.path());
    image(images.path(), "a.png", 1000);
    image(images.path(), "b.gif", 2000);

    let runner = BatchRunner::new(isolated_config(tools.path())).unwrap();
    let first = runner.run(images.path(), &mut TextReport::new(Vec::new())).await.unwrap();
    let second = runner.run(images.path(), &mut TextReport::new(Vec::new())).await.unwrap();

    assert_eq!(second.size_before, first.size_after);
    assert!(second.size_after <= first.size_after);
    assert_eq!(second.saved_bytes(), 0);
}

#[tokio::test]
async fn test_all_optimizers_failing_changes_nothing() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    for optimizer in Optimizer::ALL {
        failing_tool(tools.path(), optimizer).unwrap();
    }
    let png = image(images.path(), "a.png", 1000);
    let jpg = image(images.path(), "c.jpg", 500);

    let runner = BatchRunner::new(isolated_config(tools.path())).unwrap();
    let mut report = JsonReport::new(Vec::new());
    let totals = runner.run(images.path(), &mut report).await.unwrap();

    assert_eq!(std::fs::read(&png).unwrap(), vec![b'o'; 1000]);
    assert_eq!(std::fs::read(&jpg).unwrap(), vec![b'o'; 500]);
    assert_eq!(totals.files, 2);
    assert_eq!(totals.saved_bytes(), 0);

    let output = String::from_utf8(report.into_inner()).unwrap();
    assert_eq!(output.lines().count(), 4);
    assert!(output.lines().last().unwrap().contains(r#""type":"complete""#));
}

#[tokio::test]
async fn test_missing_root_touches_nothing() {
    let tools = TempDir::new().unwrap();
    let runner = BatchRunner::new(isolated_config(tools.path())).unwrap();

    let err = runner
        .run(&tools.path().join("missing"), &mut TextReport::new(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, OptimizeError::ScopeNotFound(_)));
}

#[test]
fn test_cli_exits_with_1_for_missing_directory() {
    let tools = TempDir::new().unwrap();
    let missing = tools.path().join("missing");

    let output = Command::new(env!("CARGO_BIN_EXE_image-optimizer"))
        .arg(&missing)
        .arg("--tools-dir")
        .arg(tools.path())
        .arg("--no-system-path")
        .arg("--quiet")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Directory does not exist"));
}

#[test]
fn test_cli_optimizes_and_prints_table() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    scenario_tools(tools.path());
    let png = image(images.path(), "a.png", 1000);
    image(images.path(), "b.gif", 2000);

    let output = Command::new(env!("CARGO_BIN_EXE_image-optimizer"))
        .arg(images.path())
        .arg("--tools-dir")
        .arg(tools.path())
        .arg("--no-system-path")
        .arg("--quiet")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(file_size(&png), 750);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let total = stdout.lines().last().unwrap();
    assert!(total.starts_with("TOTAL"));
    assert!(total.ends_with("15.00"));
}

#[test]
fn test_cli_rejects_unknown_optimizer() {
    let images = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_image-optimizer"))
        .arg(images.path())
        .arg("--disable")
        .arg("zopflipng")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("zopflipng"));
}

#[test]
fn test_cli_missing_config_file_fails_without_touching_images() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    scenario_tools(tools.path());
    let png = image(images.path(), "a.png", 1000);

    let output = Command::new(env!("CARGO_BIN_EXE_image-optimizer"))
        .arg(images.path())
        .arg("--config")
        .arg(images.path().join("dry-run-typo.json"))
        .arg("--tools-dir")
        .arg(tools.path())
        .arg("--no-system-path")
        .arg("--quiet")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(file_size(&png), 1000);
    assert!(String::from_utf8_lossy(&output.stderr).contains("dry-run-typo.json"));
}

#[test]
fn test_cli_flags_override_invalid_config_values() {
    let tools = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let settings = TempDir::new().unwrap();
    scenario_tools(tools.path());
    let png = image(images.path(), "a.png", 1000);
    let config_path = settings.path().join("config.json");
    std::fs::write(&config_path, r#"{ "workers": 0 }"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_image-optimizer"))
        .arg(images.path())
        .arg("--config")
        .arg(&config_path)
        .arg("--workers")
        .arg("2")
        .arg("--tools-dir")
        .arg(tools.path())
        .arg("--no-system-path")
        .arg("--quiet")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(file_size(&png), 750);
}
