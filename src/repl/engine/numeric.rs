//! Numeric string conversion
//!
//! Implements the string-to-number rules of the input language: surrounding
//! whitespace is ignored, the empty string is zero, `Infinity` may be signed,
//! `0x`/`0o`/`0b` prefixes select a radix and decimals may omit either side
//! of the point (`.5`, `5.`).

/// Convert a string to a number, `None` where the conversion yields `NaN`
pub fn string_to_number(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    if let Some(n) = parse_radix_literal(s) {
        return n;
    }

    if !is_decimal_literal(s) {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Whether `s` is a number under [`string_to_number`]
pub fn is_numeric(s: &str) -> bool {
    string_to_number(s).is_some()
}

/// `0x..`, `0o..`, `0b..`: `Some(None)` for a prefix with bad digits
fn parse_radix_literal(s: &str) -> Option<Option<f64>> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(None);
    }
    let mut acc = 0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => acc = acc * radix as f64 + d as f64,
            None => return Some(None),
        }
    }
    Some(Some(acc))
}

/// `[+-]? (digits ('.' digits?)? | '.' digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }

    let mut int_digits = 0;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        int_digits += 1;
    }

    let mut frac_digits = 0;
    if chars.peek() == Some(&'.') {
        chars.next();
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            frac_digits += 1;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if matches!(chars.peek(), Some('e') | Some('E')) {
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            chars.next();
        }
        let mut exp_digits = 0;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            exp_digits += 1;
        }
        if exp_digits == 0 {
            return false;
        }
    }

    chars.next().is_none()
}
