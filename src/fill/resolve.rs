//! Placeholder resolution.
//!
//! Substitutes `{Label}` and `{Label_Kisa}` tokens in filename patterns, QR
//! payloads, or any other template string. A token body is any run of
//! characters without braces; `{}` and nested braces are left as literal
//! text.
//!
//! | Token | Bound value | Output |
//! |-------|-------------|--------|
//! | `{L}` | unbound or empty | `{L}` (unchanged) |
//! | `{L}` | `data:` payload | matching signature name, or `Gorsel` |
//! | `{L_Kisa}` | company full name | company short name, or the value |
//! | `{L}` | anything else | the value |

use crate::model::{FillValues, Lookups, is_data_reference};

/// Suffix requesting a company's short name instead of the bound value.
pub const SHORT_NAME_SUFFIX: &str = "_Kisa";

/// Name substituted for image data that matches no saved signature.
pub const UNNAMED_IMAGE: &str = "Gorsel";

/// Resolve every token in `pattern` in a single left-to-right pass.
///
/// Substituted text is never re-scanned, so values containing braces are
/// inserted verbatim.
pub fn resolve(pattern: &str, values: &FillValues, lookups: &Lookups<'_>) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find(['{', '}']) {
            // Non-empty body closed before any other brace: a token.
            Some(close) if close > 0 && after_open.as_bytes()[close] == b'}' => {
                let body = &after_open[..close];
                match resolve_token(body, values, lookups) {
                    Some(text) => out.push_str(text),
                    None => {
                        out.push('{');
                        out.push_str(body);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            // `{}` or `{..{`: this brace is literal; rescan from the next one.
            Some(next) => {
                let literal_len = if after_open.as_bytes()[next] == b'}' {
                    next + 1
                } else {
                    next
                };
                out.push('{');
                out.push_str(&after_open[..literal_len]);
                rest = &after_open[literal_len..];
            }
            None => {
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Replacement text for one token body, or `None` to keep the token.
fn resolve_token<'a>(body: &str, values: &'a FillValues, lookups: &Lookups<'a>) -> Option<&'a str> {
    let (label, short_requested) = match body.strip_suffix(SHORT_NAME_SUFFIX) {
        Some(label) => (label, true),
        None => (body, false),
    };

    let value = values.get(label)?;

    if is_data_reference(value) {
        return Some(
            lookups
                .signature_by_data(value)
                .map(|s| s.name.as_str())
                .unwrap_or(UNNAMED_IMAGE),
        );
    }

    if short_requested {
        return Some(
            lookups
                .company_by_name(value)
                .map(|c| c.short_name.as_str())
                .unwrap_or(value),
        );
    }

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Company, SavedSignature};
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> FillValues {
        pairs.iter().copied().collect()
    }

    fn acme() -> Vec<Company> {
        vec![Company {
            id: "c1".into(),
            name: "Acme Corporation".into(),
            short_name: "ACME".into(),
        }]
    }

    #[test]
    fn test_pattern_without_tokens_is_identity() {
        let vals = values(&[("Ad Soyad", "Ali Veli")]);
        for pattern in ["", "Sertifika", "a } b", "{", "}", "{}", "x{}y", "tek { açık"] {
            assert_eq!(resolve(pattern, &vals, &Lookups::empty()), pattern);
        }
    }

    #[test]
    fn test_simple_substitution() {
        let vals = values(&[("Ad Soyad", "Ali Veli")]);
        assert_eq!(
            resolve("Sertifika-{Ad Soyad}", &vals, &Lookups::empty()),
            "Sertifika-Ali Veli"
        );
    }

    #[test]
    fn test_unbound_token_survives() {
        let vals = values(&[("Ad Soyad", "Ali Veli"), ("Boş", "")]);
        assert_eq!(
            resolve("{Ad Soyad} / {Kurs} / {Boş}", &vals, &Lookups::empty()),
            "Ali Veli / {Kurs} / {Boş}"
        );
    }

    #[test]
    fn test_short_name_lookup() {
        let companies = acme();
        let lookups = Lookups::new(&[], &companies);
        let vals = values(&[("Company", "Acme Corporation")]);
        assert_eq!(resolve("{Company_Kisa}", &vals, &lookups), "ACME");
        assert_eq!(resolve("{Company}", &vals, &lookups), "Acme Corporation");
    }

    #[test]
    fn test_short_name_falls_back_to_value() {
        let vals = values(&[("Company", "Acme Corporation")]);
        assert_eq!(
            resolve("{Company_Kisa}", &vals, &Lookups::empty()),
            "Acme Corporation"
        );
    }

    #[test]
    fn test_short_token_with_unbound_label_survives() {
        let companies = acme();
        let lookups = Lookups::new(&[], &companies);
        assert_eq!(
            resolve("{Firma_Kisa}", &FillValues::new(), &lookups),
            "{Firma_Kisa}"
        );
    }

    #[test]
    fn test_signature_data_resolves_to_name() {
        let signatures = vec![SavedSignature {
            id: "s1".into(),
            name: "Müdür İmzası".into(),
            url: "data:image/png;base64,AAAA".into(),
        }];
        let lookups = Lookups::new(&signatures, &[]);
        let vals = values(&[
            ("İmza", "data:image/png;base64,AAAA"),
            ("Logo", "data:image/png;base64,BBBB"),
        ]);
        assert_eq!(
            resolve("{İmza}-{Logo}", &vals, &lookups),
            "Müdür İmzası-Gorsel"
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let vals = values(&[("A", "{B}"), ("B", "never")]);
        assert_eq!(resolve("{A}", &vals, &Lookups::empty()), "{B}");
    }

    #[test]
    fn test_nested_braces_match_innermost() {
        let vals = values(&[("B", "x")]);
        assert_eq!(resolve("{A{B}}", &vals, &Lookups::empty()), "{Ax}");
        assert_eq!(resolve("{{B}", &vals, &Lookups::empty()), "{x");
    }

    #[test]
    fn test_multibyte_labels() {
        let vals = values(&[("Tür", "Eğitim"), ("Şehir", "İzmir")]);
        assert_eq!(
            resolve("{Tür}: {Şehir}", &vals, &Lookups::empty()),
            "Eğitim: İzmir"
        );
    }
}
