//! Case folding for catalog text

/// Lowercase `text` for comparisons, folding every Turkish `i` variant.
///
/// `İ`, `I` and `ı` all become ASCII `i`. Plain `to_lowercase` turns `İ`
/// into `i` plus a combining dot, which never equals a typed `i`.
pub(crate) fn fold_case(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'İ' | 'I' | 'ı' => folded.push('i'),
            _ => folded.extend(c.to_lowercase()),
        }
    }
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_turkish_i() {
        assert_eq!(fold_case("İstanbul"), "istanbul");
        assert_eq!(fold_case("ÜCRETSİZ"), "ücretsiz");
        assert_eq!(fold_case("Savaşçı"), "savaşçi");
        assert_eq!(fold_case("GRAN TURISMO"), "gran turismo");
    }
}
