//! Integration tests for ilgraph
//!
//! These tests drive the exporters end to end, from a method dump on disk to
//! graph files in a directory, both through the library and the CLI.

use ilgraph_core::load_dump;
use ilgraph_writer::{ExportConfig, ExportFormat, ExporterFactory};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/counting_loop.json")
}

fn export_fixture(format: ExportFormat, out: &Path) -> PathBuf {
    let dump = load_dump(&fixture()).unwrap();
    let config = ExportConfig {
        format,
        output_dir: out.to_path_buf(),
        ..ExportConfig::default()
    };
    let factory = ExporterFactory::new(config);
    let mut exporter = factory.create(Some(dump.method.clone()));
    for snapshot in &dump.snapshots {
        let graph = snapshot.build(Some(&dump.method)).unwrap();
        exporter.write_graph(&snapshot.title, &graph).unwrap();
    }
    exporter.complete().unwrap();
    out.join(exporter.destination().unwrap())
}

#[test]
fn test_fixture_snapshots_build() {
    let dump = load_dump(&fixture()).unwrap();
    assert_eq!(dump.snapshots.len(), 2);
    for snapshot in &dump.snapshots {
        let graph = snapshot.build(Some(&dump.method)).unwrap();
        assert_eq!(graph.statement_count(), 10);
        assert_eq!(graph.data_nodes().len(), 5);
        assert_eq!(graph.blocks().len(), 3);
    }
}

#[test]
fn test_binary_export_to_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = export_fixture(ExportFormat::Binary, temp_dir.path());

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "IlCompilation-0[demo.Counter.count(I)I][warm].bgv"
    );
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..7], b"BIGV\x07\x00\x00");
    assert_eq!(bytes.last(), Some(&0x02));
    for title in ["initial trees", "after localCSE"] {
        let needle = title.as_bytes();
        assert!(
            bytes.windows(needle.len()).any(|w| w == needle),
            "title '{}' missing",
            title
        );
    }
}

#[test]
fn test_xml_export_to_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = export_fixture(ExportFormat::Xml, temp_dir.path());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<graphDocument>\n<group>\n"));
    assert!(text.contains("<p name='name'>demo.Counter.count(I)I</p>"));
    assert_eq!(text.matches("<graph name=").count(), 2);
    assert_eq!(text.matches("<block name='3'>").count(), 2);
    assert!(text.contains("<p name='name'>iload n</p>"));
    assert!(text.ends_with("</group>\n</graphDocument>\n"));
}

#[test]
fn test_cli_export() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_ilgraph"))
        .arg("export")
        .arg(fixture())
        .args(["--format", "xml", "--out-dir"])
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let written = PathBuf::from(stdout.trim());
    assert!(written.exists());
    assert_eq!(written.extension().unwrap(), "xml");
}

#[test]
fn test_cli_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("ilgraph.toml");
    std::fs::write(
        &config,
        format!(
            "format = \"binary\"\nfile_prefix = \"Trace\"\noutput_dir = {:?}\n",
            temp_dir.path().join("graphs")
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_ilgraph"))
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(fixture())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let names: Vec<String> = std::fs::read_dir(temp_dir.path().join("graphs"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["Trace-0[demo.Counter.count(I)I][warm].bgv".to_string()]);
}

#[test]
fn test_cli_inspect() {
    let output = Command::new(env!("CARGO_BIN_EXE_ilgraph"))
        .arg("inspect")
        .arg(fixture())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("demo/Counter.count(I)I [warm]"));
    assert!(stdout.contains("initial trees: 10 statements, 15 nodes, 3 blocks"));
}

#[test]
fn test_cli_rejects_unknown_format() {
    let temp_dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_ilgraph"))
        .arg("export")
        .arg(fixture())
        .args(["--format", "svg", "--out-dir"])
        .arg(temp_dir.path())
        .output()
        .expect("Failed to execute command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown export format 'svg'"));
}
