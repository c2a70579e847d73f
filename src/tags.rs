//! Special-tag micro-language and small text helpers.
//!
//! A tag of the form `_key_value` (leading underscore, key, underscore,
//! value) is "special" and carries machine-interpretable metadata; anything
//! else is a regular user-facing tag. Site descriptions may additionally
//! open with a `tags:` directive holding one special tag before the visible
//! text.

use chrono::{Months, NaiveDate};

use crate::mappings;

/// True when `tag` uses the special-tag marker prefix.
pub fn is_special(tag: &str) -> bool {
    tag.starts_with('_')
}

/// Parse a special tag of the form `_key_value` into `(key, value)`.
///
/// Malformed tags (no marker, no second underscore, or an empty key) parse
/// to `("", "")`, which no downstream key match will ever select.
pub fn parse_special(tag: &str) -> (&str, &str) {
    let Some(rest) = tag.strip_prefix('_') else {
        return ("", "");
    };

    match rest.find('_') {
        Some(0) | None => ("", ""),
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
    }
}

/// Split a raw comma-separated tag attribute into trimmed, non-empty tags.
pub fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract the directive from a raw site description.
///
/// Returns the region label (the unlabeled sentinel when no `_region_`
/// directive with a known code is present) and the visible description,
/// defaulted to the fixed placeholder when blank.
pub fn parse_description(raw: &str) -> (String, String) {
    let mut region = mappings::UNLABELED_REGION;
    let mut description = raw;

    if let Some(stripped) = raw.strip_prefix(mappings::DESCRIPTION_TAGS_PREFIX) {
        // Only one special tag per description is supported for now; the
        // directive ends at the first whitespace.
        let directive;
        match stripped.find(char::is_whitespace) {
            Some(idx) => {
                directive = &stripped[..idx];
                description = stripped[idx..].trim_start();
            }
            None => {
                directive = stripped;
                description = "";
            }
        }

        if let Some(code) = directive.strip_prefix(mappings::REGION_TAG_PREFIX) {
            if let Some(label) = mappings::region_label(code) {
                region = label;
            }
        }
    }

    let description = description.trim();
    if description.is_empty() {
        (region.to_string(), mappings::UNDEFINED_DESCRIPTION.to_string())
    } else {
        (region.to_string(), description.to_string())
    }
}

/// Calendar-aware difference between two dates as whole years, months and
/// days. Arguments in either order.
pub fn years_months_days(start: NaiveDate, end: NaiveDate) -> (u32, u32, u32) {
    use chrono::Datelike;

    let (start, end) = if end < start { (end, start) } else { (start, end) };

    let (y1, m1, d1) = (start.year(), start.month() as i32, start.day() as i32);
    let (y2, m2, d2) = (end.year(), end.month() as i32, end.day() as i32);

    let mut years = y2 - y1;
    if m2 < m1 || (m2 == m1 && d2 < d1) {
        years -= 1;
    }

    let mut months = m2 - m1;
    if d2 < d1 {
        months -= 1;
    }
    if months < 0 {
        months += 12;
    }

    // Shift start forward by the whole years and months; what remains is a
    // plain day count.
    let shift = Months::new((years * 12 + months) as u32);
    let days = start
        .checked_add_months(shift)
        .map_or(0, |shifted| (end - shifted).num_days().max(0));

    (years as u32, months as u32, days as u32)
}
