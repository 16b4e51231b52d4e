/// Square metres in one hectare
pub const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// Hectares in one square kilometre
pub const HECTARES_PER_SQUARE_KM: f64 = 100.0;

pub fn square_metres_to_hectares(area_m2: f64) -> f64 {
    area_m2 / SQUARE_METRES_PER_HECTARE
}

pub fn hectares_to_square_km(area_ha: f64) -> f64 {
    area_ha / HECTARES_PER_SQUARE_KM
}

/// Leaf label of a hierarchical class name.
///
/// Legend names are published as `"Level 1; Level 2; Level 3"`; only the last segment
/// is shown to users.
pub fn leaf_label(hierarchical: &str) -> &str {
    hierarchical
        .rsplit("; ")
        .next()
        .unwrap_or(hierarchical)
        .trim()
}

/// Normalise a palette entry to a CSS colour.
///
/// Bare hex digits (`e6004d`) get a `#` prefix, anything else (`#e6004d`, `red`) is kept.
pub fn normalize_color(raw: &str) -> String {
    let trimmed = raw.trim();
    let is_bare_hex = matches!(trimmed.len(), 3 | 6 | 8)
        && trimmed.chars().all(|c| c.is_ascii_hexdigit());
    if is_bare_hex {
        format!("#{}", trimmed.to_ascii_lowercase())
    } else {
        trimmed.to_string()
    }
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
