use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for the translation target language.
///
/// Accepts ISO 639-1 (2-letter) and ISO 639-2 (3-letter, T or B) codes.

// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: [(&str, &str); 18] = [
    ("fre", "fra"), ("ger", "deu"), ("dut", "nld"), ("gre", "ell"),
    ("chi", "zho"), ("cze", "ces"), ("ice", "isl"), ("alb", "sqi"),
    ("arm", "hye"), ("baq", "eus"), ("bur", "mya"), ("per", "fas"),
    ("geo", "kat"), ("may", "msa"), ("mac", "mkd"), ("rum", "ron"),
    ("slo", "slk"), ("wel", "cym"),
];

/// Resolve a language code to an isolang language
pub fn resolve_language(code: &str) -> Result<Language> {
    let normalized = code.trim().to_lowercase();

    let language = match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => {
            let terminological = BIBLIOGRAPHIC_CODES.iter()
                .find(|(bibliographic, _)| *bibliographic == normalized)
                .map_or(normalized.as_str(), |(_, t)| *t);
            Language::from_639_3(terminological)
        }
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    Ok(resolve_language(code)?.to_name().to_string())
}
