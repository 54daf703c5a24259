//! Case- and diacritic-insensitive search keys.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folds `input` into its search form: NFD, combining marks stripped,
/// lowercased, runs of whitespace collapsed to a single space.
#[must_use]
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized, whitespace-separated tokens of a user query.
#[must_use]
pub fn tokens(query: &str) -> Vec<String> {
    normalize(query)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the stored search key from the searchable fields of a record.
#[must_use]
pub fn search_key<'a>(fields: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let joined = fields
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    normalize(&joined)
}

/// True when every query token occurs in `haystack`. An empty query matches.
#[must_use]
pub fn matches(haystack: &str, query: &str) -> bool {
    let haystack = normalize(haystack);
    tokens(query).iter().all(|t| haystack.contains(t.as_str()))
}

/// `%token%` pattern for SQL `LIKE ... ESCAPE '!'`.
#[must_use]
pub fn like_pattern(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    out.push('%');
    for c in token.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('%');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_case() {
        assert_eq!(normalize("Niccolò  PERÈ"), "niccolo pere");
        assert_eq!(normalize("Çà  va"), "ca va");
    }

    #[test]
    fn matching_is_case_and_diacritic_insensitive() {
        assert!(matches("Lavanderia Città", "citta"));
        assert!(matches("lavanderia citta", "CITTÀ"));
        assert!(matches("José Álvarez", "jose alvarez"));
        assert!(!matches("José Álvarez", "josefina"));
    }

    #[test]
    fn every_token_must_match() {
        assert!(matches("Mario Rossi 3331234567", "rossi 333"));
        assert!(!matches("Mario Rossi", "rossi bianchi"));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches("anything", ""));
        assert!(matches("anything", "   "));
    }

    #[test]
    fn search_key_skips_missing_fields() {
        let key = search_key([Some("Anna"), None, Some("Bianchì"), Some("anna@example.com")]);
        assert_eq!(key, "anna bianchi anna@example.com");
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%"), "%50!%%");
        assert_eq!(like_pattern("a_b!"), "%a!_b!!%");
    }
}
