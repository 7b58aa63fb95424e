//! Canonical form for path data (`d`) and point lists (`points`).
//!
//! Separator runs (whitespace and commas in any mix) collapse to a single
//! space, and trailing fractional zeros are stripped from every number.
//! Digits are otherwise left alone, so no value changes. A space is inserted
//! wherever removing characters would let two numbers run together.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Command(char),
    Number(&'a str),
}

/// Split path data into command letters and numbers, recording whether a
/// separator preceded each token. `None` on any character that belongs to
/// neither, so unknown syntax is never rewritten.
fn tokenize(value: &str) -> Option<Vec<(Token<'_>, bool)>> {
    let bytes = value.as_bytes();
    let mut tokens = Vec::new();
    let mut separated = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b',' {
            separated = true;
            i += 1;
        } else if b.is_ascii_alphabetic() {
            tokens.push((Token::Command(b as char), separated));
            separated = false;
            i += 1;
        } else if b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.') {
            let end = number_end(bytes, i)?;
            tokens.push((Token::Number(&value[i..end]), separated));
            separated = false;
            i = end;
        } else {
            return None;
        }
    }
    Some(tokens)
}

/// End of the number starting at `start`: sign, digits, fraction, exponent.
fn number_end(bytes: &[u8], start: usize) -> Option<usize> {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };
    let mut i = start;
    if matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }
    let int_end = digits(i);
    let mut end = int_end;
    let mut has_digits = int_end > i;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_end = digits(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && matches!(bytes[exp], b'+' | b'-') {
            exp += 1;
        }
        let exp_end = digits(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    Some(end)
}

/// Strip trailing zeros after the decimal point, then a bare point.
/// The exponent, if any, is kept verbatim.
pub fn trim_number(num: &str) -> String {
    let (mantissa, exponent) = match num.find(['e', 'E']) {
        Some(pos) => num.split_at(pos),
        None => (num, ""),
    };
    if !mantissa.contains('.') {
        return num.to_string();
    }
    let mut trimmed = mantissa.trim_end_matches('0').trim_end_matches('.').to_string();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "+" {
        trimmed.push('0');
    }
    trimmed.push_str(exponent);
    trimmed
}

/// Could `next` be read as a continuation of `prev` without a separator?
fn would_merge(prev: &str, next: &str) -> bool {
    match next.as_bytes().first() {
        Some(b'+' | b'-') => false,
        Some(b'.') => !prev.contains(['.', 'e', 'E']),
        _ => true,
    }
}

/// Canonicalize a `d` or `points` value. Values the tokenizer does not
/// understand come back unchanged.
pub fn canonicalize_path_data(value: &str) -> String {
    let Some(tokens) = tokenize(value) else {
        return value.to_string();
    };
    let mut out = String::with_capacity(value.len());
    let mut last_number: Option<String> = None;
    for (token, separated) in tokens {
        match token {
            Token::Command(c) => {
                if separated && !out.is_empty() {
                    out.push(' ');
                }
                out.push(c);
                last_number = None;
            }
            Token::Number(raw) => {
                let num = trim_number(raw);
                let forced = last_number
                    .as_deref()
                    .is_some_and(|prev| would_merge(prev, &num));
                if (separated || forced) && !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(&num);
                last_number = Some(num);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collapses_separators_and_trims_zeros() {
        assert_eq!(canonicalize_path_data("10.500000  20,   ,30.00"), "10.5 20 30");
        assert_eq!(canonicalize_path_data("  M 0,0 L 10.10 , 20  Z "), "M 0 0 L 10.1 20 Z");
    }

    #[test]
    fn trim_number_cases() {
        assert_eq!(trim_number("10.50"), "10.5");
        assert_eq!(trim_number("10.00"), "10");
        assert_eq!(trim_number("10"), "10");
        assert_eq!(trim_number("100"), "100");
        assert_eq!(trim_number(".0"), "0");
        assert_eq!(trim_number("-.000"), "-0");
        assert_eq!(trim_number("1.500e10"), "1.5e10");
        assert_eq!(trim_number("5."), "5");
    }

    #[test]
    fn never_merges_numbers() {
        // "1.0" then ".5" must not become "1.5".
        assert_eq!(canonicalize_path_data("M1.0.5"), "M1 .5");
        assert_eq!(canonicalize_path_data("M1.5.5"), "M1.5.5");
        assert_eq!(canonicalize_path_data("M1.0-2"), "M1-2");
        assert_eq!(canonicalize_path_data("1e2.5"), "1e2.5");
    }

    #[test]
    fn compact_commands_stay_compact() {
        assert_eq!(canonicalize_path_data("M10,20L30,40z"), "M10 20L30 40z");
        assert_eq!(canonicalize_path_data("m-1-2l.5.5"), "m-1-2l.5.5");
    }

    #[test]
    fn unknown_syntax_is_left_alone() {
        assert_eq!(canonicalize_path_data("M 1 2 ? 3"), "M 1 2 ? 3");
        assert_eq!(canonicalize_path_data("M - 1"), "M - 1");
    }

    #[test]
    fn canonical_form_is_stable() {
        for input in ["M 0.10,0 L1.0.5 Z", "10.500000  20,   ,30.00", "M1e-3.0 2"] {
            let once = canonicalize_path_data(input);
            assert_eq!(canonicalize_path_data(&once), once, "input: {input}");
        }
    }
}
