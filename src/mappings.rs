//! Closed code→label tables and fixed domain literals.
//!
//! Unrecognized codes are never import errors: every lookup here either
//! returns `None` (caller falls back to a sentinel) or the caller keeps a
//! defined default. This is what keeps old exports importable after the tag
//! vocabulary grows.

/// Region label attached to a site with no recognized region directive.
pub const UNLABELED_REGION: &str = "Unlabeled Region";

/// Description used for sites whose description is blank after directive
/// extraction.
pub const UNDEFINED_DESCRIPTION: &str = "This dive site is missing a description.";

/// Literal that opens a special-tag directive inside a site description.
pub const DESCRIPTION_TAGS_PREFIX: &str = "tags:";

/// Key prefix of the only directive currently recognized in a site
/// description.
pub const REGION_TAG_PREFIX: &str = "_region_";

/// Cylinder-type label used when the wire-format code is not in the table.
pub const UNRECOGNIZED_CYLINDER: &str = "unrecognized";

/// Map a `_region_` directive code to its display label.
pub fn region_label(code: &str) -> Option<&'static str> {
    match code {
        "europe" => Some("Europe"),
        "asia" => Some("Asia"),
        "north-america" => Some("North America"),
        "atlantic" => Some("Atlantic Ocean"),
        "indian" => Some("Indian Ocean"),
        "pacific" => Some("Pacific Ocean"),
        "mediterranean" => Some("Mediterranean Sea"),
        "red-sea" => Some("Red Sea"),
        _ => None,
    }
}

/// Map a cylinder-type code from the export to a human label.
pub fn cylinder_type_label(code: &str) -> Option<&'static str> {
    match code {
        "AL100" => Some("aluminium"),
        "HP100" | "HP130" => Some("steel"),
        _ => None,
    }
}

/// True when `value` is already one of the labels [`cylinder_type_label`]
/// can produce, including the unrecognized sentinel. Used to keep cylinder
/// normalization idempotent.
pub fn is_cylinder_label(value: &str) -> bool {
    matches!(value, "aluminium" | "steel" | UNRECOGNIZED_CYLINDER)
}

/// Map an `_award_` tag value to its display label.
pub fn award_label(code: &str) -> Option<&'static str> {
    match code {
        "1st-dive" => Some("First dive!"),
        "1st-seawater-dive" => Some("First seawater dive!"),
        "1st-shark-encounter" => Some("First shark encounter!"),
        "1st-night-dive" => Some("First night dive!"),
        "1st-30m-dive" => Some("First 30m dive!"),
        "1st-40m-dive" => Some("First 40m dive!"),
        "1st-wreck-dive" => Some("First wreck dive!"),
        "1st-wreck-penetration" => Some("First wreck penetration dive!"),
        "cert-owd" => Some("OWD diver! (CMAS)"),
        "cert-aowd-nitrox" => Some("AOWD diver! Nitrox specialty diver! (SSI)"),
        "cert-navigation" => Some("Navigation specialty diver! (SSI)"),
        "cert-dry" => Some("Dry suit specialty diver! (SSI)"),
        "cert-deep" => Some("Deep specialty diver! (PADI)"),
        "cert-wreck" => Some("Wreck specialty diver! (PADI)"),
        "100th-dive" => Some("100th dive!"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup() {
        assert_eq!(region_label("atlantic"), Some("Atlantic Ocean"));
        assert_eq!(region_label("red-sea"), Some("Red Sea"));
        assert_eq!(region_label("antarctica"), None);
        assert_eq!(region_label(""), None);
    }

    #[test]
    fn test_cylinder_lookup() {
        assert_eq!(cylinder_type_label("AL100"), Some("aluminium"));
        assert_eq!(cylinder_type_label("HP130"), Some("steel"));
        assert_eq!(cylinder_type_label("XX12"), None);
    }

    #[test]
    fn test_cylinder_labels_are_recognized_as_labels() {
        assert!(is_cylinder_label("aluminium"));
        assert!(is_cylinder_label("steel"));
        assert!(is_cylinder_label("unrecognized"));
        assert!(!is_cylinder_label("AL100"));
    }

    #[test]
    fn test_award_lookup() {
        assert_eq!(award_label("100th-dive"), Some("100th dive!"));
        assert_eq!(award_label("cert-deep"), Some("Deep specialty diver! (PADI)"));
        assert_eq!(award_label("201st-dive"), None);
    }
}
