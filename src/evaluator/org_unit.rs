//! Organizational-unit label normalization.
//!
//! Upstream data carries the same unit under many spellings: the full area
//! name (`区域三室`), the short form (`三室`), the bare numeral (`三`), or
//! an Arabic digit (`3室`). All of them fold onto one canonical short code
//! so that unit comparisons compare codes, never raw text.
//!
//! Text that is not a unit at all (empty labels, equipment names like
//! `模拟机`, free text) maps to [`OrgUnit::Invalid`]. Invalid never equals
//! anything, itself included, so blank or junk input can never make two
//! participants "the same unit" by accident.

/// Canonical unit numerals, in order. Codes are interned so [`OrgUnit`]
/// stays `Copy` and comparisons are pointer-width.
const UNIT_CODES: [&str; 10] = ["一", "二", "三", "四", "五", "六", "七", "八", "九", "十"];

/// Area prefixes stripped before matching, longest first.
const AREA_PREFIXES: [&str; 3] = ["区域管制", "区域", "管制"];

/// Unit suffixes stripped before matching, longest first.
const UNIT_SUFFIXES: [&str; 3] = ["科室", "室", "科"];

/// A normalized organizational unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgUnit {
    /// A recognized unit, identified by its canonical short code.
    Unit(&'static str),
    /// Not a unit: empty, equipment names, free text. Compares equal to
    /// nothing (see [`OrgUnit::same_as`]).
    Invalid,
}

impl OrgUnit {
    /// The canonical code, if this is a recognized unit.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            OrgUnit::Unit(code) => Some(code),
            OrgUnit::Invalid => None,
        }
    }

    /// Unit equality with the invalid sentinel excluded: `Invalid` matches
    /// nothing, not even another `Invalid`.
    pub fn same_as(&self, other: &OrgUnit) -> bool {
        matches!((self, other), (OrgUnit::Unit(a), OrgUnit::Unit(b)) if a == b)
    }
}

/// Fold a raw organizational-unit label onto its canonical code.
pub fn normalize(label: &str) -> OrgUnit {
    let mut s = label.trim();
    if s.is_empty() {
        return OrgUnit::Invalid;
    }

    for prefix in AREA_PREFIXES {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest;
            break;
        }
    }
    for suffix in UNIT_SUFFIXES {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest;
            break;
        }
    }
    let s = s.trim();

    if let Some(code) = UNIT_CODES.iter().find(|&&code| code == s) {
        return OrgUnit::Unit(code);
    }
    // Arabic spelling of the same unit number, e.g. "3室".
    if let Ok(n) = s.parse::<usize>() {
        if (1..=UNIT_CODES.len()).contains(&n) {
            return OrgUnit::Unit(UNIT_CODES[n - 1]);
        }
    }

    OrgUnit::Invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_spellings_fold_to_one_code() {
        let full = normalize("区域三室");
        let short = normalize("三室");
        let bare = normalize("三");

        assert_eq!(full, OrgUnit::Unit("三"));
        assert_eq!(full, short);
        assert_eq!(short, bare);
        assert!(full.same_as(&bare));
    }

    #[test]
    fn test_arabic_digits_fold_too() {
        assert_eq!(normalize("3室"), OrgUnit::Unit("三"));
        assert_eq!(normalize("区域3室"), OrgUnit::Unit("三"));
        assert_eq!(normalize("10室"), OrgUnit::Unit("十"));
        assert_eq!(normalize("1"), OrgUnit::Unit("一"));
    }

    #[test]
    fn test_prefix_and_suffix_variants() {
        assert_eq!(normalize("管制五室"), OrgUnit::Unit("五"));
        assert_eq!(normalize("五科"), OrgUnit::Unit("五"));
        assert_eq!(normalize("区域管制五科室"), OrgUnit::Unit("五"));
        assert_eq!(normalize("  三室  "), OrgUnit::Unit("三"));
    }

    #[test]
    fn test_non_unit_text_is_invalid() {
        assert_eq!(normalize("模拟机"), OrgUnit::Invalid);
        assert_eq!(normalize(""), OrgUnit::Invalid);
        assert_eq!(normalize("   "), OrgUnit::Invalid);
        assert_eq!(normalize("综合办公"), OrgUnit::Invalid);
        assert_eq!(normalize("0室"), OrgUnit::Invalid);
        assert_eq!(normalize("11室"), OrgUnit::Invalid);
    }

    #[test]
    fn test_invalid_matches_nothing_including_itself() {
        let invalid = normalize("模拟机");
        assert!(!invalid.same_as(&normalize("三")));
        assert!(!invalid.same_as(&normalize("")));
        assert!(!invalid.same_as(&invalid));
    }

    #[test]
    fn test_normalize_is_idempotent_on_codes() {
        for code in ["一", "三", "十"] {
            let unit = normalize(code);
            assert_eq!(normalize(unit.code().unwrap()), unit);
        }
    }
}
