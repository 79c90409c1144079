//! Test fixtures for end-to-end extraction runs
//!
//! Provides a stand-in for the bulk_extractor binary: a shell script that
//! honours `-o <dir> ... <input>` and behaves according to the input's name.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use bulkx_protocol::InputFile;
use bulkx_worker::TaskConfig;

/// report.xml written by the fake extractor
pub const REPORT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dfxml xmloutputversion="1.0">
  <creator version="1.0">
    <program>BULK_EXTRACTOR</program>
    <version>2.0.3</version>
    <execution_environment>
      <command_line>bulk_extractor -o out disk.raw</command_line>
      <start_time>2024-03-01T10:00:00Z</start_time>
    </execution_environment>
  </creator>
  <report>
    <elapsed_seconds>1.25</elapsed_seconds>
  </report>
  <feature_files>
    <feature_file><name>email</name><count>5</count></feature_file>
    <feature_file><name>url</name><count>12</count></feature_file>
    <feature_file><name>ip</name><count>5</count></feature_file>
  </feature_files>
</dfxml>
"#;

/// Behaviour keyed on the input file name:
/// - `*fail*`     exit 3 without writing anything
/// - `*nodir*`    exit 0 without creating the output directory
/// - `*noreport*` exit 0 with artifacts but no report.xml
/// - `*badxml*`   exit 0 with an unparseable report.xml
/// - `*slow*`     sleep for a long time
/// - `*orphan*`   sleep in a child process that keeps the output pipes open
/// - `*fileout*`  exit 0 leaving a regular file where the directory should be
/// - `*binary*`   print a non-UTF-8 line, pause, then a lot more output
/// - otherwise    report.xml, three non-empty artifacts and one empty file
const FAKE_EXTRACTOR: &str = r#"#!/bin/sh
out=""
input=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) input="$1"; shift ;;
  esac
done

echo "fake extractor: $input -> $out"
echo "diagnostics on stderr" >&2
name=$(basename "$input")

case "$name" in
  *fail*) exit 3 ;;
  *nodir*) exit 0 ;;
  *slow*) exec sleep 30 ;;
  *orphan*) sleep 30; exit 0 ;;
  *fileout*) printf 'oops' > "$out"; exit 0 ;;
  *binary*)
    printf 'scanning \377\376 path\n'
    sleep 1
    i=0
    while [ $i -lt 2000 ]; do echo "progress line $i"; i=$((i+1)); done
    ;;
esac

mkdir -p "$out/jpeg_carved/000"
printf 'alice@example.com\tctx\n' > "$out/email.txt"
printf 'http://example.com/\n' > "$out/url.txt"
printf '\377\330\377\340' > "$out/jpeg_carved/000/4096.jpg"
: > "$out/ip.txt"

case "$name" in
  *noreport*) exit 0 ;;
  *badxml*) printf '<dfxml><creator>' > "$out/report.xml"; exit 0 ;;
esac

cp "$(dirname "$0")/report.xml" "$out/report.xml"
exit 0
"#;

/// Install the fake extractor (and its report.xml) in `dir`.
#[cfg(unix)]
pub fn install_fake_extractor(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("report.xml"), REPORT_XML).unwrap();

    let script = dir.join("bulk_extractor");
    fs::write(&script, FAKE_EXTRACTOR).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Config pointing at the fake extractor.
#[cfg(unix)]
pub fn fake_config(bin_dir: &Path) -> TaskConfig {
    TaskConfig {
        extractor: install_fake_extractor(bin_dir).display().to_string(),
        ..TaskConfig::default()
    }
}

/// Create an input file with some content.
pub fn make_input(dir: &Path, name: &str) -> InputFile {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, b"raw disk bytes").unwrap();
    let mut input = InputFile::new(name, path);
    input.uuid = Some(format!("uuid-{}", name));
    input
}

/// Directories left directly under `output_path` (extraction dirs).
pub fn leftover_dirs(output_path: &Path) -> Vec<PathBuf> {
    fs::read_dir(output_path)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect()
}
