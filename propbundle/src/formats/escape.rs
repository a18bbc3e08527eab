//! Escape handling for the `key=value` format.

use tracing::warn;

/// Byte index of the first `=` or `:` not preceded by a backslash.
///
/// Any character following a backslash is skipped, so `a\=b=c` yields the index
/// of the second `=`.
pub fn find_key_value_separator(line: &str) -> Option<usize> {
    let mut chars = line.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '=' | ':' => return Some(index),
            _ => {}
        }
    }
    None
}

/// Drops every backslash of a raw key.
pub fn unescape_key(key: &str) -> String {
    key.chars().filter(|&c| c != '\\').collect()
}

/// Decodes `\uXXXX` and the `\t \r \n \f` short escapes. Any other escaped
/// character stands for itself.
///
/// Malformed `\u` sequences never fail: a warning is logged and the offending
/// character is used instead. A `\u` with fewer than four characters left is
/// kept as written.
pub fn convert_encoded_to_unicode(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut pending_high: Option<u16> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' || i >= chars.len() {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }

        let escaped = chars[i];
        i += 1;
        if escaped == 'u' && i + 4 <= chars.len() {
            match decode_hex_unit(&chars[i..i + 4]) {
                Ok(unit) => push_code_unit(&mut out, &mut pending_high, unit),
                Err(offending) => {
                    let sequence: String = chars[i - 2..i + 4].iter().collect();
                    warn!(%sequence, "malformed \\uxxxx encoding");
                    flush_surrogate(&mut out, &mut pending_high);
                    out.push(offending);
                }
            }
            i += 4;
            continue;
        }

        flush_surrogate(&mut out, &mut pending_high);
        match escaped {
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'n' => out.push('\n'),
            'f' => out.push('\u{000C}'),
            'u' => out.push_str("\\u"),
            other => out.push(other),
        }
    }
    flush_surrogate(&mut out, &mut pending_high);
    out
}

/// Only `\r` and `\n` become control characters; everything else is kept.
pub fn convert_line_breaks(input: &str) -> String {
    input.replace("\\r", "\r").replace("\\n", "\n")
}

fn decode_hex_unit(digits: &[char]) -> Result<u16, char> {
    digits.iter().try_fold(0u16, |acc, &digit| {
        digit
            .to_digit(16)
            .map(|value| (acc << 4) | value as u16)
            .ok_or(digit)
    })
}

fn push_code_unit(out: &mut String, pending_high: &mut Option<u16>, unit: u16) {
    match unit {
        0xD800..=0xDBFF => {
            flush_surrogate(out, pending_high);
            *pending_high = Some(unit);
        }
        0xDC00..=0xDFFF => match pending_high.take() {
            Some(high) => {
                let decoded = char::decode_utf16([high, unit])
                    .next()
                    .and_then(Result::ok)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                out.push(decoded);
            }
            None => {
                warn!(unit = %format!("{unit:04X}"), "unpaired low surrogate");
                out.push(char::REPLACEMENT_CHARACTER);
            }
        },
        _ => {
            flush_surrogate(out, pending_high);
            out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
    }
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u16>) {
    if let Some(high) = pending_high.take() {
        warn!(unit = %format!("{high:04X}"), "unpaired high surrogate");
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

/// Escapes a value so that [`convert_encoded_to_unicode`] restores it.
///
/// Backslashes are doubled, `\t \r \n \f` use their short forms, and anything
/// outside printable ASCII becomes `\uXXXX` (surrogate pairs above the BMP).
pub fn convert_unicode_to_encoded(input: &str, uppercase_hex: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\u{000C}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    if uppercase_hex {
                        out.push_str(&format!("\\u{:04X}", unit));
                    } else {
                        out.push_str(&format!("\\u{:04x}", unit));
                    }
                }
            }
        }
    }
    out
}

/// Escapes only line breaks, for bundles written without unicode escaping.
pub fn escape_line_breaks(input: &str) -> String {
    input.replace('\r', "\\r").replace('\n', "\\n")
}
