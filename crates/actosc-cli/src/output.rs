use serde::Serialize;
use std::io::{IsTerminal, Write};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:width$}", width = widths.get(i).copied().unwrap_or(0)))
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.to_vec());
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    line(sep.iter().map(String::as_str).collect());
    for row in rows {
        line(row.iter().map(String::as_str).collect());
    }
}

// ---------------------------------------------------------------------------
// Console control
// ---------------------------------------------------------------------------

/// Escape sequences are only written to a real terminal.
fn emit(sequence: &str) {
    let mut stdout = std::io::stdout();
    if stdout.is_terminal() {
        let _ = stdout.write_all(sequence.as_bytes());
        let _ = stdout.flush();
    }
}

pub fn clear_screen() {
    emit("\x1b[2J\x1b[H");
}

pub fn set_title(title: &str) {
    emit(&format!("\x1b]0;{title}\x07"));
}

/// Move the cursor to a 1-based `row` and `col`.
pub fn move_cursor(row: u16, col: u16) {
    emit(&format!("\x1b[{row};{col}H"));
}
