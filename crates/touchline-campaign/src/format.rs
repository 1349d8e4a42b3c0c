//! Report section rendering.
//!
//! Three mutually exclusive layouts keyed by the test kind's data layout:
//! frame grid, profile segments, and pin table. Each section embeds the
//! limits the kernel was judged against, in the same row-width convention
//! as its data. Execution failures short-circuit to an error-only section.

use touchline_core::{descriptor, DataLayout, TestItem};
use touchline_hal::{ChannelWindow, DeviceGeometry, PIN_COUNT};

use crate::dispatch::Execution;

/// Pin-table row width, fixed by the plant report convention.
const PIN_TABLE_WIDTH: usize = 32;

/// Render the full data + limits section for one executed item.
pub fn render_section(item: &TestItem, geometry: DeviceGeometry, execution: &Execution) -> String {
    let desc = descriptor(item.kind);
    let mut out = String::new();
    out.push_str(desc.title);
    out.push('\n');

    match execution {
        Execution::Generic {
            reading,
            limit_lo,
            limit_hi,
        } => match desc.layout {
            DataLayout::Frame => {
                grid(&mut out, &reading.data, geometry);
                min_max_line(&mut out, &reading.data);
                if !limit_lo.is_empty() {
                    out.push_str("min limit:\n");
                    grid(&mut out, limit_lo, geometry);
                }
                if !limit_hi.is_empty() {
                    out.push_str("max limit:\n");
                    grid(&mut out, limit_hi, geometry);
                }
            }
            DataLayout::Profile => {
                profile(&mut out, &reading.data, geometry);
                min_max_line(&mut out, &reading.data);
                if !limit_lo.is_empty() {
                    out.push_str("min limit:\n");
                    profile(&mut out, limit_lo, geometry);
                }
                if !limit_hi.is_empty() {
                    out.push_str("max limit:\n");
                    profile(&mut out, limit_hi, geometry);
                }
            }
            DataLayout::Pins => {
                raw_bytes_line(&mut out, &reading.data);
                let pins = pins_from_bytes(&reading.data, item.channel_window.as_ref());
                out.push_str("pins:\n");
                pin_table(&mut out, &pins);
                if !limit_lo.is_empty() {
                    out.push_str("limit:\n");
                    pin_table(&mut out, limit_lo);
                }
            }
        },
        Execution::ExHighResistance { reading } => {
            grid(&mut out, &reading.frame, geometry);
            min_max_line(&mut out, &reading.frame);
            segment(&mut out, "rx roe profile:", &reading.rx_profile);
            segment(&mut out, "tx roe profile:", &reading.tx_profile);
            if let Some(tixels) = item.tixel_limit {
                out.push_str(&format!("tixel limit: {tixels}\n"));
            }
            if let Some(rx_roe) = item.rx_roe_limit {
                out.push_str(&format!("rx roe limit: {rx_roe}\n"));
            }
            if let Some(tx_roe) = item.tx_roe_limit {
                out.push_str(&format!("tx roe limit: {tx_roe}\n"));
            }
        }
        Execution::ExTrxShort {
            reading,
            channel_limit,
        } => {
            out.push_str("pins:\n");
            pin_table(&mut out, &reading.pins);
            segment(&mut out, "ex pins:", &reading.ex_pins);
            out.push_str("limit:\n");
            pin_table(&mut out, channel_limit);
            if let Some([pin_1, pin_2]) = item.ex_pin_limit {
                out.push_str(&format!("ex pin limit: {pin_1} {pin_2}\n"));
            }
        }
    }
    out
}

/// Error-only section: test name, "Error Out", hardware error text.
pub fn render_error(title: &str, message: &str) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str("Error Out\n");
    out.push_str(message);
    out.push('\n');
    out
}

/// Section for an item whose limits never resolved.
pub fn render_invalid(item: &TestItem) -> String {
    let mut out = String::new();
    out.push_str(item.title());
    out.push('\n');
    out.push_str("invalid test limit\n");
    for fault in &item.faults {
        out.push_str(fault);
        out.push('\n');
    }
    out
}

/// Section for an item skipped because the campaign was aborted.
pub fn render_terminated(title: &str) -> String {
    format!("{title}\nterminated\n")
}

/// Expand raw pin-short bytes into per-pin states: bit value for assigned
/// pins, `-1` for pins outside the channel window.
pub fn pins_from_bytes(bytes: &[i32], window: Option<&ChannelWindow>) -> Vec<i32> {
    (0..PIN_COUNT)
        .map(|pin| {
            let assigned = window.map(|w| w.contains_pin(pin)).unwrap_or(true);
            if !assigned {
                return -1;
            }
            let byte = bytes.get(pin / 8).copied().unwrap_or(0);
            (byte >> (pin % 8)) & 1
        })
        .collect()
}

/// `cols` printed rows of `rows` values each, with column headers.
/// Data is row-major (`index = r * cols + c`); the plant report transposes.
fn grid(out: &mut String, data: &[i32], geometry: DeviceGeometry) {
    out.push_str("      ");
    for r in 0..geometry.rows {
        out.push_str(&format!("{:>6}", format!("R{r:02}")));
    }
    out.push('\n');
    for c in 0..geometry.cols {
        out.push_str(&format!("{:<6}", format!("C{c:02}:")));
        for r in 0..geometry.rows {
            let value = data.get(r * geometry.cols + c).copied().unwrap_or(0);
            out.push_str(&format!("{value:>6}"));
        }
        out.push('\n');
    }
}

/// Two labeled segments: the first `rows` elements, then the `cols` rest.
fn profile(out: &mut String, data: &[i32], geometry: DeviceGeometry) {
    let split = geometry.rows.min(data.len());
    segment(out, "row channels:", &data[..split]);
    segment(out, "column channels:", &data[split..]);
}

fn segment(out: &mut String, label: &str, values: &[i32]) {
    out.push_str(label);
    out.push('\n');
    for value in values {
        out.push_str(&format!("{value:>6}"));
    }
    out.push('\n');
}

fn raw_bytes_line(out: &mut String, bytes: &[i32]) {
    out.push_str("raw:");
    for byte in bytes {
        out.push_str(&format!(" 0x{byte:02x}"));
    }
    out.push('\n');
}

fn pin_table(out: &mut String, values: &[i32]) {
    for chunk in values.chunks(PIN_TABLE_WIDTH) {
        for value in chunk {
            out.push_str(&format!("{value:>4}"));
        }
        out.push('\n');
    }
}

fn min_max_line(out: &mut String, data: &[i32]) {
    let min = data.iter().min().copied().unwrap_or(0);
    let max = data.iter().max().copied().unwrap_or(0);
    out.push_str(&format!("min: {min}  max: {max}\n"));
}
