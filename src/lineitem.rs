// ===============================
// src/lineitem.rs
// ===============================
//
// Turns one human-authored order line ("2x Vodka (18.50)") into a
// {name, quantity} pair. Lines that carry no usable name are dropped:
// a silent skip here is always preferable to failing a whole forecast
// over one badly typed record.
//
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ParsedLineItem;

// "<name> x<N>" / "<name> X<N>" / "<name> ×<N>"
static SUFFIX_QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*[xX×]\s*(\d+)\s*$").expect("suffix pattern"));
// "<N>x<name>" / "<N>X<name>" / "<N>×<name>"
static PREFIX_QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*[xX×]\s*(.*?)\s*$").expect("prefix pattern"));
// Trailing "x<N>"-ish noise stripped in the quantity-1 fallback.
static TRAILING_QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[xX×]\s*\d+\s*$").expect("trailing pattern"));

/// Parse one items line. First match wins: quantity suffix, quantity
/// prefix, then bare name with quantity 1. Returns `None` for blank
/// lines and lines whose name trims to nothing.
pub fn parse_line(line: &str) -> Option<ParsedLineItem> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(c) = SUFFIX_QTY.captures(line) {
        return build(c[1].trim(), c[2].parse().ok());
    }
    if let Some(c) = PREFIX_QTY.captures(line) {
        return build(c[2].trim(), c[1].parse().ok());
    }
    build(TRAILING_QTY.replace(line, "").trim(), Some(1))
}

fn build(name: &str, quantity: Option<u32>) -> Option<ParsedLineItem> {
    if name.is_empty() {
        return None;
    }
    Some(ParsedLineItem {
        name: name.to_string(),
        // "x0" and unparsable multipliers still mean the line was ordered once.
        quantity: quantity.unwrap_or(1).max(1),
    })
}

/// Parse a whole items text field, one product per line.
pub fn parse_items(items: &str) -> Vec<ParsedLineItem> {
    items.lines().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: u32) -> ParsedLineItem {
        ParsedLineItem {
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn quantity_prefix_and_suffix_agree() {
        assert_eq!(parse_line("3x Vodka"), Some(item("Vodka", 3)));
        assert_eq!(parse_line("Vodka x3"), Some(item("Vodka", 3)));
        assert_eq!(parse_line("Vodka X3"), Some(item("Vodka", 3)));
        assert_eq!(parse_line("Vodka × 3"), Some(item("Vodka", 3)));
    }

    #[test]
    fn prefix_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_line("2× Vodka (18.50€)"),
            Some(item("Vodka (18.50€)", 2))
        );
    }

    #[test]
    fn bare_line_falls_back_to_quantity_one() {
        assert_eq!(parse_line("Red Bull 25cl"), Some(item("Red Bull 25cl", 1)));
    }

    #[test]
    fn blank_and_nameless_lines_are_dropped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("x3"), None);
        assert_eq!(parse_line(" × 12 "), None);
    }

    #[test]
    fn zero_multiplier_clamps_to_one() {
        assert_eq!(parse_line("Vodka x0"), Some(item("Vodka", 1)));
    }

    #[test]
    fn multi_line_items_skip_blanks() {
        let items = "2x Vodka\n\nRed Bull x4\n   \nChips";
        assert_eq!(
            parse_items(items),
            vec![item("Vodka", 2), item("Red Bull", 4), item("Chips", 1)]
        );
    }
}
