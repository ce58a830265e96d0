//! Text clean-up for values lifted out of catalog pages.

/// Literal the catalog prints when a value is not defined.
pub const NOT_DEFINED: &str = "N.D.";

/// Trim whitespace, then blank out the "not defined" marker.
/// " N.D. " → "" | " 1.598 cc " → "1.598 cc"
pub fn clean_value(s: &str) -> String {
    s.trim().replace(NOT_DEFINED, "")
}

/// Keep at most `width` leading characters. Used to drop trailing units.
/// "1850 kg" (4) → "1850"
pub fn truncate_chars(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

/// Everything before the first `unit`, minus its final character
/// (the space that separates number and unit).
/// "1,6 l" ('l') → "1,6" | "" → ""
pub fn before_unit(s: &str, unit: char) -> String {
    let head = s.split(unit).next().unwrap_or_default();
    let mut chars = head.chars();
    chars.next_back();
    chars.as_str().to_string()
}

/// Drop the leading currency marker ("€ ") from a trimmed price.
/// "€ 312,50" → "312,50"
pub fn strip_currency(s: &str) -> String {
    s.trim().chars().skip(2).collect()
}

/// Replace decimal commas with periods. Idempotent.
pub fn normalise_separator(s: &str) -> String {
    s.replace(',', ".")
}

/// Render a derived decimal the way prior exports print it:
/// integral values keep one decimal place, everything else uses the
/// shortest representation that round-trips.
/// 315.0 → "315.0" | 0.3 → "0.3" | 0.25 → "0.25"
pub fn render_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Resolve a photo `src` against the site root: the leading slash is
/// dropped and spaces are percent-encoded.
pub fn resolve_image_url(root: &str, src: &str) -> String {
    let path: String = src.chars().skip(1).collect();
    format!("{}{}", root, path.replace(' ', "%20"))
}

/// Short brand token for log lines: whatever follows the last `=`.
/// "modelli.jsp?brand=ALFA ROMEO" → "ALFA ROMEO"
pub fn brand_label(path: &str) -> &str {
    path.rsplit('=').next().unwrap_or(path)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
