//! End-to-end tests for the `cyclog` binary.

use std::io::Write;
use std::path::Path;

use assert_cmd::Command;
use cyclog_format::{pack_args, ArgValue, FormatString};
use cyclog_test_utils::StreamBuilder;
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

const CATALOG: &str = r#"{
    "formats": [
        { "id": 3, "format": "PING" },
        { "id": 4, "format": "disk %s at %u%%", "file": "disk.cc", "line": 7, "level": "WARNING" }
    ]
}"#;

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

fn disk_payload(name: &str, pct: u64) -> Vec<u8> {
    let fmt = FormatString::parse("disk %s at %u%%").unwrap();
    pack_args(&fmt, &[ArgValue::Str(name.into()), ArgValue::Uint(pct)]).unwrap()
}

fn cyclog(catalog: &Path, log: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cyclog").unwrap();
    cmd.arg(log).arg("--catalog").arg(catalog);
    cmd
}

struct Fixture {
    _dir: TempDir,
    catalog: std::path::PathBuf,
    log: std::path::PathBuf,
}

fn fixture(stream: Vec<u8>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let catalog = write_file(&dir, "catalog.json", CATALOG.as_bytes());
    let log = write_file(&dir, "app.clog", &stream);
    Fixture {
        _dir: dir,
        catalog,
        log,
    }
}

fn ping_stream() -> Vec<u8> {
    StreamBuilder::new()
        .checkpoint(1e9)
        .message(3, 100, &[])
        .raw_message(0, 50, &[])
        .build()
}

#[test]
fn decompresses_example_stream() {
    let fx = fixture(ping_stream());
    let expected = format!(
        "Opening file {}\n\
         Found a checkpoint. CyclesPerSec=1000000000.000000\n   \
         0) +    100.00 ns: PING\n   \
         1) +     50.00 ns: PING\n\
         Decompression complete after printing 2 log messages\n",
        fx.log.display()
    );
    cyclog(&fx.catalog, &fx.log)
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn max_messages_limits_output() {
    let fx = fixture(ping_stream());
    cyclog(&fx.catalog, &fx.log)
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("0) +"))
        .stdout(predicate::str::contains("1) +").not())
        .stdout(predicate::str::contains("after printing 1 log messages"));
}

#[test]
fn zero_max_messages_means_unlimited() {
    let fx = fixture(ping_stream());
    cyclog(&fx.catalog, &fx.log)
        .arg("0")
        .assert()
        .success()
        .stdout(predicate::str::contains("after printing 2 log messages"));
}

#[test]
fn origin_flag_prefixes_location() {
    let stream = StreamBuilder::new()
        .message(4, 10, &disk_payload("/var", 91))
        .build();
    let fx = fixture(stream);
    cyclog(&fx.catalog, &fx.log)
        .arg("--origin")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ns: disk.cc:7 WARNING: disk /var at 91%",
        ));
}

#[test]
fn checkpoint_calibration_rescales_time() {
    let stream = StreamBuilder::new()
        .checkpoint(2e9)
        .message(3, 400, &[])
        .build();
    let fx = fixture(stream);
    cyclog(&fx.catalog, &fx.log)
        .args(["--calibration", "checkpoint"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0) +    200.00 ns: PING"));
}

#[test]
fn decode_error_exits_nonzero_after_partial_output() {
    let stream = StreamBuilder::new()
        .message(3, 10, &[])
        .message(9, 20, &[])
        .build();
    let fx = fixture(stream);
    cyclog(&fx.catalog, &fx.log)
        .assert()
        .failure()
        .stdout(predicate::str::contains("0) +     10.00 ns: PING"))
        .stdout(predicate::str::contains("Decompression complete").not())
        .stderr(predicate::str::contains("no decoder registered for format id 9"));
}

fn occurs_once(needle: &'static str) -> impl predicates::Predicate<str> {
    predicate::function(move |s: &str| s.matches(needle).count() == 1)
}

#[test]
fn error_causes_are_reported_once() {
    let stream = StreamBuilder::new().message(9, 20, &[]).build();
    let fx = fixture(stream);
    cyclog(&fx.catalog, &fx.log)
        .assert()
        .failure()
        .stderr(occurs_once("no decoder registered for format id 9"))
        .stderr(predicate::str::contains("entry at byte 0, after 0 messages"));

    let dir = TempDir::new().unwrap();
    let catalog = write_file(&dir, "catalog.json", b"{1}");
    let log = write_file(&dir, "app.clog", &[]);
    cyclog(&catalog, &log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog JSON: key must be a string"))
        .stderr(occurs_once("key must be a string"));
}

#[test]
fn corrupt_tag_exits_nonzero() {
    let stream = StreamBuilder::new().message(3, 10, &[]).raw(&[0x0F]).build();
    let fx = fixture(stream);
    cyclog(&fx.catalog, &fx.log).assert().failure();
}

#[test]
fn missing_log_file_fails() {
    let mut catalog = NamedTempFile::new().unwrap();
    catalog.write_all(CATALOG.as_bytes()).unwrap();
    cyclog(catalog.path(), Path::new("/nonexistent/app.clog"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open /nonexistent/app.clog"));
}

#[test]
fn invalid_catalog_fails() {
    let dir = TempDir::new().unwrap();
    let catalog = write_file(&dir, "catalog.json", br#"{"formats":[{"id":1,"format":"%*d"}]}"#);
    let log = write_file(&dir, "app.clog", &[]);
    cyclog(&catalog, &log)
        .assert()
        .failure()
        .stderr(predicate::str::contains("format id 1"));
}

#[test]
fn argument_errors_fail() {
    Command::cargo_bin("cyclog")
        .unwrap()
        .arg("app.clog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--catalog"));

    let fx = fixture(ping_stream());
    cyclog(&fx.catalog, &fx.log).arg("many").assert().failure();
    cyclog(&fx.catalog, &fx.log)
        .args(["--cycles-per-second", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycles per second"));
}
