use crate::dispatch::{OscValue, OutputMessage};
use std::fmt::Write;

/// Render a tick's messages grouped by type: ints, then floats, then bools.
/// Empty groups are left out. `name_width` is the longest configured
/// parameter name.
pub fn render(messages: &[OutputMessage], name_width: usize) -> String {
    let dashes = "-".repeat((name_width + 12) / 2 - 4);
    let mut out = String::from("DEBUG OUTPUT:\n");

    let ints: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m.value, OscValue::Int(_)))
        .collect();
    let floats: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m.value, OscValue::Float(_)))
        .collect();
    let bools: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m.value, OscValue::Bool(_)))
        .collect();

    // Writing into a String cannot fail.
    if !ints.is_empty() {
        let _ = writeln!(out, "{dashes}- Ints -{dashes}");
        for m in ints {
            let _ = writeln!(out, "{:<name_width$} : {}", m.name, m.value);
        }
    }
    if !floats.is_empty() {
        let _ = writeln!(out, "{dashes} Floats {dashes}");
        for m in floats {
            let _ = writeln!(out, "{:<name_width$} : {}", m.name, m.value);
        }
    }
    if !bools.is_empty() {
        let _ = writeln!(out, "{dashes}- Bools {dashes}");
        for m in bools {
            let OscValue::Bool(b) = m.value else { continue };
            // Trailing space clears the extra letter when False turns True.
            let shown = if b { "True" } else { "False" };
            let _ = writeln!(out, "{:<name_width$} : {shown} ", m.name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_in_fixed_order() {
        let messages = [
            OutputMessage::new("Connected", OscValue::Bool(true)),
            OutputMessage::new("Speed", OscValue::Float(0.7)),
            OutputMessage::new("Count", OscValue::Int(3)),
        ];
        let text = render(&messages, 9);
        let expected = "DEBUG OUTPUT:\n\
            ------- Ints -------\n\
            Count     : 3\n\
            ------ Floats ------\n\
            Speed     : 0.700000\n\
            ------- Bools ------\n\
            Connected : True \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn zero_width_when_nothing_configured() {
        let text = render(&[OutputMessage::new("C", OscValue::Bool(false))], 0);
        assert_eq!(text, "DEBUG OUTPUT:\n--- Bools --\nC : False \n");
    }

    #[test]
    fn empty_groups_are_omitted() {
        let text = render(&[], 4);
        assert_eq!(text, "DEBUG OUTPUT:\n");
    }
}
