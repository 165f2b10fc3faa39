/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Parse a share value. Anything that is not a finite number is `None`,
/// which callers treat as missing rather than zero.
pub fn parse_share(raw: Option<&str>) -> Option<f64> {
    let v: f64 = clean_str(raw?).parse().ok()?;
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_parsing() {
        assert_eq!(parse_share(Some("0.42")), Some(0.42));
        assert_eq!(parse_share(Some(" \"0.5\" ")), Some(0.5));
        assert_eq!(parse_share(Some("1e-3")), Some(0.001));
        assert_eq!(parse_share(Some("")), None);
        assert_eq!(parse_share(Some("n/a")), None);
        assert_eq!(parse_share(Some("NaN")), None);
        assert_eq!(parse_share(Some("inf")), None);
        assert_eq!(parse_share(None), None);
    }
}
