//! Output filename derivation.

use crate::fill::resolve;
use crate::model::{FillValues, Lookups};

/// Extension appended to every exported document.
pub const EXTENSION: &str = "pdf";

/// Pattern used when a project has none.
pub const FALLBACK_PATTERN: &str = "Sertifika";

/// Turkish letters kept as-is alongside ASCII letters and digits.
const LOCALE_LETTERS: &str = "ğüşıöçĞÜŞİÖÇ";

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == ' ' || LOCALE_LETTERS.contains(c)
}

/// Replace every character outside the allow-list with `_`.
///
/// The allow-list is ASCII letters and digits, the Turkish letters
/// `ğüşıöçĞÜŞİÖÇ`, hyphen and space. Idempotent.
///
/// Replacement is per `char`, not per UTF-16 code unit: an emoji or any
/// other character outside the Basic Multilingual Plane becomes a single `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

/// Resolve `pattern` against the fill values and sanitise it, without
/// the extension. An empty pattern falls back to `fallback`.
pub fn derive_stem(pattern: &str, fallback: &str, values: &FillValues, lookups: &Lookups<'_>) -> String {
    let pattern = if pattern.is_empty() { fallback } else { pattern };
    sanitize_filename(&resolve(pattern, values, lookups))
}

/// [`derive_stem`] plus the document extension.
pub fn derive_filename(pattern: &str, fallback: &str, values: &FillValues, lookups: &Lookups<'_>) -> String {
    format!("{}.{}", derive_stem(pattern, fallback, values, lookups), EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Company;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spaces_and_turkish_letters_survive() {
        let mut values = FillValues::new();
        values.insert("Ad Soyad", "Ali Veli");
        assert_eq!(
            derive_stem("Sertifika-{Ad Soyad}", FALLBACK_PATTERN, &values, &Lookups::empty()),
            "Sertifika-Ali Veli"
        );
        assert_eq!(sanitize_filename("Şükrü Öztürk İçel"), "Şükrü Öztürk İçel");
    }

    #[test]
    fn test_astral_characters_become_one_underscore() {
        assert_eq!(sanitize_filename("Ali 🎓 Veli"), "Ali _ Veli");
        assert_eq!(sanitize_filename("𝔸"), "_");
    }

    #[test]
    fn test_other_characters_become_underscores() {
        assert_eq!(sanitize_filename("a/b\\c:d.e"), "a_b_c_d_e");
        assert_eq!(sanitize_filename("Café 2024!"), "Caf_ 2024_");
        assert_eq!(sanitize_filename("tab\there"), "tab_here");
    }

    #[test]
    fn test_unresolved_braces_are_sanitised() {
        assert_eq!(
            derive_filename("Belge-{Eksik}", FALLBACK_PATTERN, &FillValues::new(), &Lookups::empty()),
            "Belge-_Eksik_.pdf"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        for name in ["Sertifika-Ali Veli", "a/b:c", "Ğ?ü*ş", "", "___", "x.y.z"] {
            let once = sanitize_filename(name);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn test_empty_pattern_uses_fallback() {
        assert_eq!(
            derive_filename("", FALLBACK_PATTERN, &FillValues::new(), &Lookups::empty()),
            "Sertifika.pdf"
        );
    }

    #[test]
    fn test_short_company_names_in_filenames() {
        let companies = vec![Company::new("Acme Corporation", "ACME")];
        let lookups = Lookups::new(&[], &companies);
        let mut values = FillValues::new();
        values.insert("Firma", "Acme Corporation");
        assert_eq!(
            derive_filename("{Firma_Kisa}-Katilim", FALLBACK_PATTERN, &values, &lookups),
            "ACME-Katilim.pdf"
        );
    }
}
