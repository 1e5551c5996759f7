//! Minimal TOML parser for node configuration
//!
//! Handles only the subset of TOML that `node.toml` uses: no arrays,
//! inline tables, booleans or multi-line strings.
//!
//! Supported features:
//! - [section] headers
//! - Key = value pairs (string, integer, float)
//! - Comments (# ...), including trailing comments
//!
//! Unknown keys are ignored so older images accept newer files. Keys that
//! are absent keep their default value.

use heapless::String;

use super::types::NodeConfig;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// String longer than its field allows
    TooLong,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Link,
    Broker,
    Periods,
    Thresholds,
}

/// Parse TOML configuration into a [`NodeConfig`]
pub fn parse_config(input: &str) -> Result<NodeConfig, ParseError> {
    let mut config = NodeConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = strip_comment(line);
            if !header.ends_with(']') {
                return Err(ParseError::InvalidSection);
            }
            section = parse_section_header(&header[1..header.len() - 1])?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config)?;
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "link" => Ok(Section::Link),
        "broker" => Ok(Section::Broker),
        "periods" => Ok(Section::Periods),
        "thresholds" => Ok(Section::Thresholds),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing `# comment` that is not inside a string
fn strip_comment(value: &str) -> &str {
    let mut in_string = false;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return value[..i].trim(),
            _ => {}
        }
    }
    value
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = strip_comment(line[eq_pos + 1..].trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_bounded<const N: usize>(value: &str) -> Result<String<N>, ParseError> {
    String::try_from(parse_string(value)).map_err(|_| ParseError::TooLong)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    strip_separators(value)
        .parse()
        .map_err(|_| ParseError::InvalidValue)
}

fn parse_float(value: &str) -> Result<f32, ParseError> {
    let v: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Like [`parse_int`], but zero is rejected
fn parse_period(value: &str) -> Result<u32, ParseError> {
    match parse_int(value)? {
        0 => Err(ParseError::InvalidValue),
        v => Ok(v),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut NodeConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => {}
        Section::Link => {
            let link = &mut config.link;
            match key {
                "ssid" => link.ssid = parse_bounded(value)?,
                "password" => link.password = parse_bounded(value)?,
                "join_timeout_ms" => link.join_timeout_ms = parse_period(value)?,
                "retry_interval_ms" => link.retry_interval_ms = parse_period(value)?,
                _ => {}
            }
        }
        Section::Broker => {
            let broker = &mut config.broker;
            match key {
                "host" => broker.host = parse_bounded(value)?,
                "port" => {
                    broker.port = match parse_int(value)? {
                        0 => return Err(ParseError::InvalidValue),
                        port => port,
                    }
                }
                "client_id" => broker.client_id = parse_bounded(value)?,
                "keep_alive_s" => broker.keep_alive_s = parse_int(value)?,
                "topic" => broker.topic = parse_bounded(value)?,
                "retry_delay_ms" => broker.retry_delay_ms = parse_period(value)?,
                _ => {}
            }
        }
        Section::Periods => {
            let periods = &mut config.periods;
            let slot = match key {
                "thermal_ms" => &mut periods.thermal_ms,
                "light_ms" => &mut periods.light_ms,
                "motion_ms" => &mut periods.motion_ms,
                "snapshot_ms" => &mut periods.snapshot_ms,
                "display_ms" => &mut periods.display_ms,
                "publish_idle_ms" => &mut periods.publish_idle_ms,
                "dequeue_timeout_ms" => &mut periods.dequeue_timeout_ms,
                "lock_timeout_ms" => &mut periods.lock_timeout_ms,
                _ => return Ok(()),
            };
            *slot = parse_period(value)?;
        }
        Section::Thresholds => {
            let thresholds = &mut config.thresholds;
            match key {
                "light_lux" => thresholds.light_lux = parse_float(value)?,
                "collision_g" => thresholds.collision_g = parse_float(value)?,
                "collision_hold_cycles" => {
                    thresholds.collision_hold_cycles = parse_int(value)?
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Remove TOML digit separators (`10_000`)
fn strip_separators(value: &str) -> String<24> {
    let mut out = String::new();
    for c in value.chars().filter(|c| *c != '_') {
        if out.push(c).is_err() {
            // Longer than any integer we accept; make parse() reject it
            out.clear();
            let _ = out.push('x');
            break;
        }
    }
    out
}
