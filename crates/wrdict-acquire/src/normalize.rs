use unicode_normalization::UnicodeNormalization;

/// Normalize a term to NFC and collapse runs of whitespace to one space.
///
/// Word lists come from many sources; accented letters may arrive
/// precomposed or decomposed (é vs e + U+0301), and the checkpoint must
/// see one spelling so resumed runs skip terms they already fetched.
pub fn normalize_term(input: &str) -> String {
    let nfc: String = input.nfc().collect();
    nfc.split_whitespace().collect::<Vec<_>>().join(" ")
}
