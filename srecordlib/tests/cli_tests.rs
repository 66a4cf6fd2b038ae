#![cfg(feature = "cli")]

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use srecordlib::SRecord;
use std::path::PathBuf;
use std::process::Command;

const SRECLI_EXE: &str = env!("CARGO_BIN_EXE_srecli");

fn abs_path(path_str: &str) -> String {
    std::fs::canonicalize(PathBuf::from(path_str))
        .unwrap_or_else(|_| panic!("Failed retrieving absolute file path: {path_str}"))
        .to_string_lossy()
        .into_owned()
}

#[test]
fn test_srecli_shows_help() {
    for flag in ["--help", "help", "-h"] {
        // Act
        let output = Command::new(SRECLI_EXE)
            .arg(flag)
            .output()
            .expect("Failed to run srecli");

        // Assert
        assert!(
            output.status.success(),
            "command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("Usage"),
            "stdout did not look like help text:\n{stdout}"
        );
    }
}

#[test]
fn test_srecli_shows_info_valid() {
    // Arrange
    let path_str = "tests/fixtures/firmware.s28";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["info", path_str])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(&abs_path(path_str))
            && stdout.contains("fw24")
            && stdout.contains("60 bytes")
            && stdout.contains("0x0010_0000 - 0x0010_0113")
            && stdout.contains("S2"),
        "stdout did not look like info text:\n{stdout}"
    );
}

#[test]
fn test_srecli_shows_info_invalid() {
    // Arrange
    let path_str = "tests/cli_tests.rs";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args(["info", path_str])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("File type not supported") && stderr.contains(&abs_path(path_str)),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - broken checksum
    let output = Command::new(SRECLI_EXE)
        .args(["info", "tests/fixtures/bad_checksum.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("line #4") && stderr.contains("checksum"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}

#[test]
fn test_srecli_convert_valid() {
    // Arrange
    let in_path_str = "tests/fixtures/example.s19";
    let out_path_str = "build/t1-cli/example.bin";

    // Act - S-Record to binary
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, out_path_str, "--gap-fill", "0x00"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(&abs_path(in_path_str)) && stdout.contains(&abs_path(out_path_str)),
        "stdout did not look like convert text:\n{stdout}"
    );
    assert_eq!(
        std::fs::read(out_path_str).expect("Failed to read output"),
        std::fs::read("tests/fixtures/example.bin").expect("Failed to read fixture")
    );

    // Arrange
    let in_path_str = "tests/fixtures/example.bin";
    let out_path_str = "build/t1-cli/example.s37";

    // Act - binary to S-Record
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, out_path_str, "--address", "0x80000000"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let srec = SRecord::from_srec(out_path_str).unwrap_or_default();
    assert_eq!(srec.sadr(), 0x8000_0000);
    assert_eq!(srec.size(), 70);

    // Arrange
    let in_path_str = "tests/fixtures/example.s19";
    let out_path_str = "build/t1-cli/reformatted.s19";

    // Act - S-Record re-formatting
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, out_path_str, "--line-length", "26"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let text = std::fs::read_to_string(out_path_str).unwrap_or_default();
    assert_eq!(text.lines().filter(|l| l.starts_with("S1")).count(), 9);
}

#[test]
fn test_srecli_convert_invalid() {
    // Arrange
    let in_path_str = "tests/fixtures/example.s19";

    // Act - unsupported output file type
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, "build/t2-cli/example.hex"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Input or output files are of unsupported type"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - provided address flag for S-Record input
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, "build/t2-cli/example.bin", "--address", "0x0"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Base address '--address' is only supported for BIN to S-Record conversion"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - missing address for binary input
    let output = Command::new(SRECLI_EXE)
        .args(["convert", "tests/fixtures/example.bin", "build/t2-cli/example.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Base address '--address' is required for BIN to S-Record conversion"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - gap fill for S-Record output
    let output = Command::new(SRECLI_EXE)
        .args(["convert", in_path_str, "build/t2-cli/example.s28", "--gap-fill", "0xFF"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Gap fill '--gap-fill' is only supported for S-Record to BIN conversion"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - strict parsing of a converted binary
    let output = Command::new(SRECLI_EXE)
        .args(["convert", "tests/fixtures/example.bin", "build/t2-cli/no_s0.s19", "--address", "0"])
        .output()
        .expect("Failed to run srecli");
    assert!(output.status.success());
    let output = Command::new(SRECLI_EXE)
        .args(["info", "build/t2-cli/no_s0.s19", "--strict"])
        .output()
        .expect("Failed to run srecli");

    // Assert: written records always carry an S0 line
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_srecli_merge_valid() {
    // Arrange
    let out_path_str = "build/t3-cli/merged.s28";

    // Act
    let output = Command::new(SRECLI_EXE)
        .args([
            "merge",
            out_path_str,
            "tests/fixtures/firmware.s28",
            "tests/fixtures/example.bin:0x100030",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let srec = SRecord::from_srec(out_path_str).unwrap_or_default();
    assert_eq!(srec.header_str(), "fw24");
    assert_eq!(srec.blocks().len(), 3);
    assert_eq!(srec.sadr(), 0x10_0000);
    assert_eq!(srec.get_byte(0x10_0030), Some(0x7C));
    assert_eq!(srec.get_byte(0x10_0075), Some(0x00));
    assert_eq!(srec.get_byte(0x10_0076), None);
}

#[test]
fn test_srecli_merge_invalid() {
    // Act - too few inputs
    let output = Command::new(SRECLI_EXE)
        .args(["merge", "build/t4-cli/merged.s19", "tests/fixtures/example.s19"])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Usage: srecli merge"),
        "stderr did not contain expected error text:\n{stderr}"
    );

    // Act - binary input without base address
    let output = Command::new(SRECLI_EXE)
        .args([
            "merge",
            "build/t4-cli/merged.s19",
            "tests/fixtures/example.s19",
            "tests/fixtures/example.bin",
        ])
        .output()
        .expect("Failed to run srecli");

    // Assert
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Base address required for binary file"),
        "stderr did not contain expected error text:\n{stderr}"
    );
}
