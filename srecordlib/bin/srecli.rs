use srecordlib::SRecord;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(PartialEq, Eq)]
enum FileType {
    Bin,
    SRec,
    Other,
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");

    println!(" -------------------------------------------------------------------");
    println!("|  Motorola S-Record Utility  | v{version} - Copyright (c) 2026 Ihar Hlukhau |");
    println!(" -------------------------------------------------------------------");
    println!("\nUsage:");
    println!("  srecli info <input> [--strict]");
    println!("  srecli convert <input> <output> [options]");
    println!("  srecli merge <output> <input1>[:addr] ... <inputN>[:addr] [options]");
    println!("\nOptions:");
    println!("  --address <val>       Base address when converting from BIN");
    println!(
        "  --gap-fill <val>      Byte to fill gaps when converting / merging to BIN (default: 0xFF)"
    );
    println!("  --line-length <n>     Characters per S-Record data line (default: 32 data bytes)");
    println!("  --strict              Reject S-Records lacking S0 or a matching S7/S8/S9 line");
    println!("\nSupported extensions: .s19 .s28 .s37 .srec .mot (S-Record), .bin (binary)");
    println!("\nExamples:");
    println!("  srecli info firmware.s19");
    println!("  srecli convert firmware.s19 firmware.bin --gap-fill 0x00");
    println!("  srecli convert firmware.bin firmware.s37 --address 0x80000000");
    println!("  srecli convert firmware.s19 reformatted.s19 --line-length 46");
    println!("  srecli merge final.s28 bootloader.s19 app.bin:0x8000");
}

fn main() {
    // Log to stderr, level from RUST_LOG (default: warn)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    println!();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];

    // Dispatch and immediately handle results
    if let Err(e) = run_dispatch(command, &args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run_dispatch(cmd: &str, args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let strict = args.iter().any(|arg| arg == "--strict");

    match cmd {
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        "info" => {
            // Guard: Check args count
            let path_str = args.get(2).ok_or("Missing input file path")?;

            // Guard: File must exist
            let abs_path =
                validate_exists(path_str).map_err(|_| format!("File not found: {path_str}"))?;

            run_info(&abs_path, strict)
        }
        "convert" => {
            // Guard: Check file paths arguments given
            let in_path_str = args.get(2).ok_or("Missing input path")?;
            let out_path_str = args.get(3).ok_or("Missing output path")?;

            // Guard: Check input exists
            let in_abs_path = validate_exists(in_path_str)?;

            let out_path = PathBuf::from(out_path_str);
            let in_file_type = get_file_type(&in_abs_path);
            let out_file_type = get_file_type(&out_path);

            // Guard: Check files are of a supported type
            if in_file_type == FileType::Other || out_file_type == FileType::Other {
                return Err("Input or output files are of unsupported type".into());
            }

            // Guard: Binary to binary is a plain copy
            if in_file_type == FileType::Bin && out_file_type == FileType::Bin {
                return Err("Cannot convert between binary files".into());
            }

            let addr_str = get_flag_value(args, "--address");
            let gap_fill_str = get_flag_value(args, "--gap-fill");

            // Guard: Check address is provided ONLY if converting FROM bin
            if addr_str.is_some() && in_file_type != FileType::Bin {
                return Err(
                    "Base address '--address' is only supported for BIN to S-Record conversion"
                        .into(),
                );
            } else if addr_str.is_none() && in_file_type == FileType::Bin {
                return Err(
                    "Base address '--address' is required for BIN to S-Record conversion".into(),
                );
            }

            let base_addr = if let Some(addr) = addr_str {
                Some(parse_hex_str(&addr).map_err(|_e| format!("Invalid address: {addr}"))?)
            } else {
                None
            };

            // Guard: Handle optional gap fill ONLY if converting TO bin
            if gap_fill_str.is_some() && out_file_type != FileType::Bin {
                return Err(
                    "Gap fill '--gap-fill' is only supported for S-Record to BIN conversion".into(),
                );
            }
            let gap_fill = parse_gap_fill(gap_fill_str)?;
            let line_length = parse_line_length(args)?;

            run_convert(&in_abs_path, &out_path, base_addr, gap_fill, line_length, strict)
        }
        "merge" => {
            if args.len() < 5 {
                return Err(
                    "Usage: srecli merge <output> <input1>[:addr] ... <inputN>[:addr]".into(),
                );
            }

            // Guard: Check output file path argument given
            let out_path_str = args.get(2).ok_or("Missing output path")?;
            let out_path = PathBuf::from(out_path_str);
            if get_file_type(&out_path) == FileType::Other {
                return Err(format!("Unsupported output file type: {out_path_str}").into());
            }

            // Collect input file paths and optional base addresses
            let mut inputs: Vec<(PathBuf, Option<u64>)> = Vec::new();
            for arg in &args[3..] {
                if arg.starts_with("--") {
                    break; // stop at flags
                }

                let (path_str, addr_str) = match arg.rsplit_once(':') {
                    Some((path, addr)) => (path, Some(addr)),
                    None => (arg.as_str(), None),
                };
                let in_abs_path = validate_exists(path_str)?;
                let addr = if let Some(addr) = addr_str {
                    Some(parse_hex_str(addr).map_err(|_e| format!("Invalid address: {addr}"))?)
                } else {
                    None
                };
                inputs.push((in_abs_path, addr));
            }

            let gap_fill = parse_gap_fill(get_flag_value(args, "--gap-fill"))?;
            let line_length = parse_line_length(args)?;

            run_merge(inputs, &out_path, gap_fill, line_length, strict)
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn load(
    path: &Path,
    base_addr: Option<u64>,
    strict: bool,
) -> Result<SRecord, Box<dyn std::error::Error>> {
    let mut srec = SRecord::new();
    srec.set_strict_parsing(strict);
    match get_file_type(path) {
        FileType::SRec => {
            if base_addr.is_some() {
                return Err(format!(
                    "Base address is only supported for binary files: {}",
                    path.display()
                )
                .into());
            }
            srec.load_srec(path)?;
        }
        FileType::Bin => {
            let base_addr = base_addr.ok_or_else(|| {
                format!("Base address required for binary file: {}", path.display())
            })?;
            srec.load_bin(path, base_addr)?;
        }
        FileType::Other => {
            return Err(format!("File type not supported: {}", path.display()).into());
        }
    }
    Ok(srec)
}

fn write(
    srec: &mut SRecord,
    path: &Path,
    gap_fill: u8,
    line_length: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if get_file_type(path) == FileType::Bin {
        srec.write_bin(path, gap_fill)
    } else {
        srec.write_srec(path, line_length)
    }
}

fn run_info(path: &Path, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    fn format_addr(addr: u64) -> String {
        let s = format!("{addr:08X}");
        format!("0x{}_{}", &s[0..4], &s[4..8])
    }

    fn format_with_commas(n: usize) -> String {
        let s = n.to_string();
        s.as_bytes()
            .rchunks(3)
            .rev()
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",")
    }

    let base_addr = (get_file_type(path) == FileType::Bin).then_some(0x0);
    let srec = load(path, base_addr, strict)?;

    let record_type = match srec.address_width() {
        Some(width) => format!("S{}", width.data_record() as u8),
        None => "-".to_string(),
    };

    println!("File Path:   {}", path.display());
    println!("Header:      {}", srec.header_str());
    println!("Data Size:   {} bytes", format_with_commas(srec.size()));
    println!("Blocks:      {}", srec.blocks().len());
    println!(
        "Range:       {} - {}",
        format_addr(srec.sadr()),
        format_addr(srec.eadr().saturating_sub(1)),
    );
    println!("Record Type: {record_type}");
    println!("Start Addr:  {}", format_addr(srec.start_address_definition()));
    Ok(())
}

fn run_convert(
    in_path: &Path,
    out_path: &Path,
    addr: Option<u64>,
    gap_fill: u8,
    line_length: Option<usize>,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut srec = load(in_path, addr, strict)?;
    write(&mut srec, out_path, gap_fill, line_length)?;

    // Validate output file was written
    let out_abs_path = validate_exists(&out_path.to_string_lossy())?;

    println!(
        "Converted {} -> {}",
        in_path.display(),
        out_abs_path.display()
    );
    Ok(())
}

fn run_merge(
    inputs: Vec<(PathBuf, Option<u64>)>,
    out_path: &Path,
    gap_fill: u8,
    line_length: Option<usize>,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut master = SRecord::new();

    for (path, addr) in inputs {
        let srec = load(&path, addr, strict)?;

        // Keep the first S-Record header and start address
        if master.blocks().is_empty() && !srec.header().is_empty() {
            master.set_header(srec.header());
            master.set_start_address_definition(srec.start_address_definition());
        }

        // Later inputs overwrite earlier ones
        for block in &srec {
            master.set_range(block.clone())?;
        }
    }

    write(&mut master, out_path, gap_fill, line_length)?;

    // Validate output file was written
    let out_abs_path = validate_exists(&out_path.to_string_lossy())?;

    println!("Successfully merged files into {}", out_abs_path.display());
    Ok(())
}

// =============================== HELPER FUNCTIONS ===============================

/// Parse a string as a hex number (with optional 0x prefix)
fn parse_hex_str(s: &str) -> Result<u64, std::num::ParseIntError> {
    let s = s.trim();

    // Handle explicit 0x prefix
    if let Some(hex_str) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex_str, 16);
    }

    // Parse as hex without prefix
    u64::from_str_radix(s, 16)
}

/// Gap fill byte from the optional flag value (default: 0xFF)
fn parse_gap_fill(value: Option<String>) -> Result<u8, Box<dyn std::error::Error>> {
    let Some(gap_fill) = value else {
        return Ok(0xFF);
    };
    let parsed = parse_hex_str(&gap_fill).map_err(|_e| format!("Invalid gap fill: {gap_fill}"))?;
    Ok(u8::try_from(parsed).map_err(|_e| format!("Invalid gap fill: {gap_fill}"))?)
}

/// Decimal line length from '--line-length', if given
fn parse_line_length(args: &[String]) -> Result<Option<usize>, Box<dyn std::error::Error>> {
    let Some(len) = get_flag_value(args, "--line-length") else {
        return Ok(None);
    };
    let parsed = len
        .trim()
        .parse::<usize>()
        .map_err(|_e| format!("Invalid line length: {len}"))?;
    Ok(Some(parsed))
}

/// Determine `FileType` based on the file's extension (case-insensitive)
fn get_file_type(path: &Path) -> FileType {
    const SREC_EXTENSIONS: [&str; 5] = ["s19", "s28", "s37", "srec", "mot"];

    let Some(ext) = path.extension() else {
        return FileType::Other;
    };
    if SREC_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
        FileType::SRec
    } else if ext.eq_ignore_ascii_case("bin") {
        FileType::Bin
    } else {
        FileType::Other
    }
}

/// Validate that a path exists and is a file. Returns absolute path.
fn validate_exists(path_str: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(format!("File not found: {path_str}").into());
    }
    if !path.is_file() {
        return Err(format!("Path is not a file: {path_str}").into());
    }
    // Return absolute path
    Ok(std::fs::canonicalize(path)?)
}

/// Find the value after a specific flag (e.g., "--gap-fill 0xFF")
fn get_flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}
