//! Build script for vigia-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time
//! - Checks the CYW43 firmware blobs are present

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bounds mirrored from vigia-core's configuration types
const MAX_SSID_LEN: usize = 32;
const MAX_PASSWORD_LEN: usize = 64;
const MAX_HOST_LEN: usize = 64;
const MAX_CLIENT_ID_LEN: usize = 32;
const MAX_TOPIC_LEN: usize = 128;

fn main() {
    setup_linker();
    validate_config();
    check_radio_firmware();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds node.toml for its Wi-Fi and broker          ║\n\
            ║  settings. Create one in the vigia-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);
    validate_link(&config);
    validate_broker(&config);
    validate_numbers(&config);

    println!("cargo:warning=node.toml validated successfully");
}

/// The radio firmware is not redistributed here; copy it from
/// embassy's `cyw43-firmware` directory
fn check_radio_firmware() {
    let missing: Vec<String> = ["43439A0.bin", "43439A0_clm.bin"]
        .iter()
        .map(|name| Path::new("cyw43-firmware").join(name))
        .inspect(|path| println!("cargo:rerun-if-changed={}", path.display()))
        .filter(|path| !path.exists())
        .map(|path| format!("{} not found", path.display()))
        .collect();

    fail_with("CYW43 firmware missing (copy it from embassy)", &missing);
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build with a boxed list of problems
fn fail_with(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["link", "broker"]
        .iter()
        .filter(|section| !matches!(config.get(**section), Some(toml::Value::Table(_))))
        .map(|section| format!("Missing [{}] section", section))
        .collect();

    fail_with("Missing required sections in node.toml", &errors);
}

/// Check a string key is present (when `required`) and fits its bound
fn check_string(
    table: &toml::Value,
    section: &str,
    key: &str,
    max_len: usize,
    required: bool,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        Some(toml::Value::String(s)) => {
            if s.len() > max_len {
                errors.push(format!("[{}] {} longer than {} bytes", section, key, max_len));
            }
            if s.is_empty() && required {
                errors.push(format!("[{}] {} cannot be empty", section, key));
            }
        }
        Some(_) => errors.push(format!("[{}] {} must be a string", section, key)),
        None if required => errors.push(format!("[{}] missing '{}'", section, key)),
        None => {}
    }
}

fn validate_link(config: &toml::Value) {
    let Some(link) = config.get("link") else {
        return;
    };
    let mut errors = Vec::new();

    check_string(link, "link", "ssid", MAX_SSID_LEN, true, &mut errors);
    check_string(link, "link", "password", MAX_PASSWORD_LEN, false, &mut errors);

    fail_with("Invalid [link] configuration", &errors);
}

fn validate_broker(config: &toml::Value) {
    let Some(broker) = config.get("broker") else {
        return;
    };
    let mut errors = Vec::new();

    check_string(broker, "broker", "host", MAX_HOST_LEN, true, &mut errors);
    check_string(broker, "broker", "client_id", MAX_CLIENT_ID_LEN, false, &mut errors);
    check_string(broker, "broker", "topic", MAX_TOPIC_LEN, false, &mut errors);

    if let Some(topic) = broker.get("topic").and_then(|t| t.as_str()) {
        if topic.contains('+') || topic.contains('#') {
            errors.push("[broker] topic cannot contain wildcards".to_string());
        }
    }

    match broker.get("port") {
        Some(toml::Value::Integer(port)) if (1..=65535).contains(port) => {}
        Some(_) => errors.push("[broker] port must be 1-65535".to_string()),
        None => {}
    }

    if let Some(toml::Value::Integer(keep_alive)) = broker.get("keep_alive_s") {
        if !(0..=65535).contains(keep_alive) {
            errors.push("[broker] keep_alive_s must be 0-65535".to_string());
        }
    }

    fail_with("Invalid [broker] configuration", &errors);
}

/// Periods must be positive; thresholds must be numbers
fn validate_numbers(config: &toml::Value) {
    let mut errors = Vec::new();

    for section in ["link", "broker", "periods"] {
        let Some(toml::Value::Table(table)) = config.get(section) else {
            continue;
        };
        for (key, value) in table.iter().filter(|(k, _)| k.ends_with("_ms")) {
            match value {
                toml::Value::Integer(ms) if *ms > 0 && *ms <= u32::MAX as i64 => {}
                _ => errors.push(format!("[{}] {} must be a positive integer", section, key)),
            }
        }
    }

    if let Some(toml::Value::Table(thresholds)) = config.get("thresholds") {
        for key in ["light_lux", "collision_g"] {
            match thresholds.get(key) {
                Some(toml::Value::Float(_)) | Some(toml::Value::Integer(_)) | None => {}
                Some(_) => errors.push(format!("[thresholds] {} must be a number", key)),
            }
        }
        match thresholds.get("collision_hold_cycles") {
            Some(toml::Value::Integer(n)) if (0..=65535).contains(n) => {}
            Some(_) => errors.push("[thresholds] collision_hold_cycles must be 0-65535".to_string()),
            None => {}
        }
    }

    fail_with("Invalid numeric values in node.toml", &errors);
}
