//! camelCase word handling shared by the name importer and the enum
//! classifier.
//!
//! A "word" starts at an uppercase letter that follows a lowercase letter or
//! digit, at the last capital of an acronym run that is followed by a
//! lowercase letter (`URLString` is `URL` + `String`), or after an
//! underscore. Digits and underscores stay attached to the word before them.

use fxhash::FxHashSet;
use lazy_static::lazy_static;
use smallvec::SmallVec;

lazy_static! {
    /// Host keywords and names that may never be produced by shortening.
    static ref RESERVED_NAMES: FxHashSet<&'static str> = [
        "as", "associatedtype", "break", "case", "catch", "class", "continue", "default", "defer",
        "deinit", "do", "else", "enum", "extension", "fallthrough", "false", "for", "func", "guard",
        "if", "import", "in", "init", "inout", "internal", "is", "let", "nil", "operator", "private",
        "protocol", "public", "repeat", "rethrows", "return", "self", "Self", "static", "struct",
        "subscript", "super", "switch", "throw", "throws", "true", "try", "typealias", "var", "where",
        "while", "Type", "Protocol",
    ]
    .into_iter()
    .collect();
}

/// Words of a camelCase identifier, as slices of `text`.
pub type Words<'a> = SmallVec<[&'a str; 8]>;

/// Splits `text` into camelCase words.
pub fn camel_case_words(text: &str) -> Words<'_> {
    let bytes = text.as_bytes();
    let mut words = Words::new();
    let mut start = 0;
    for index in 1..bytes.len() {
        if is_word_start(bytes, index) {
            words.push(&text[start..index]);
            start = index;
        }
    }
    if start < bytes.len() {
        words.push(&text[start..]);
    }
    words
}

fn is_word_start(bytes: &[u8], index: usize) -> bool {
    let prev = bytes[index - 1];
    let current = bytes[index];
    if current == b'_' {
        return false;
    }
    if prev == b'_' {
        return current.is_ascii_alphanumeric();
    }
    if !current.is_ascii_uppercase() {
        return false;
    }
    if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
        return true;
    }
    if prev.is_ascii_uppercase() {
        return bytes.get(index + 1).map_or(false, |next| next.is_ascii_lowercase());
    }
    false
}

/// Compares two words, ignoring the case of their first letter.
pub fn words_match(left: &str, right: &str) -> bool {
    let mut left_chars = left.chars();
    let mut right_chars = right.chars();
    match (left_chars.next(), right_chars.next()) {
        (Some(l), Some(r)) => l.eq_ignore_ascii_case(&r) && left_chars.as_str() == right_chars.as_str(),
        (None, None) => true,
        _ => false,
    }
}

/// Whether `text` begins with `prefix` and the prefix ends on a word boundary.
pub fn has_word_prefix(text: &str, prefix: &str) -> bool {
    if prefix.is_empty() || !text.starts_with(prefix) {
        return false;
    }
    text.len() == prefix.len() || is_word_start(text.as_bytes(), prefix.len())
}

/// Whether `text` ends with `suffix` and the suffix starts on a word boundary.
pub fn has_word_suffix(text: &str, suffix: &str) -> bool {
    if suffix.is_empty() || !text.ends_with(suffix) {
        return false;
    }
    let split = text.len() - suffix.len();
    split == 0 || is_word_start(text.as_bytes(), split)
}

/// Lowercases the first word: `URLString` becomes `urlString`, `Name`
/// becomes `name`.
pub fn lowercase_first_word(text: &str) -> String {
    let words = camel_case_words(text);
    let Some(first) = words.first() else {
        return String::new();
    };
    let rest = &text[first.len()..];
    let is_acronym = first.len() > 1 && first.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if is_acronym {
        return format!("{}{}", first.to_ascii_lowercase(), rest);
    }
    let mut chars = first.chars();
    match chars.next() {
        Some(head) => format!("{}{}{}", head.to_ascii_lowercase(), chars.as_str(), rest),
        None => rest.to_string(),
    }
}

/// Uppercases the first letter.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(head) => format!("{}{}", head.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(head) if head.is_ascii_alphabetic() || head == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub fn is_reserved(text: &str) -> bool {
    RESERVED_NAMES.contains(text)
}

/// Whether a shortened name may replace the original.
pub fn is_acceptable_shortening(text: &str) -> bool {
    !text.is_empty() && is_identifier(text) && !is_reserved(text)
}

/// Whether a name word is implied by a type word. `Index` is implied by the
/// integer type names.
fn word_implied_by(name_word: &str, type_word: &str) -> bool {
    if words_match(name_word, type_word) {
        return true;
    }
    matches!(name_word, "Index" | "index") && matches!(type_word, "Int" | "UInt" | "Integer" | "Int32" | "Int64")
}

/// Drops the trailing words of `name` that restate the trailing words of
/// `type_name`. Returns `None` when nothing was dropped or the result would
/// not be an acceptable identifier.
///
/// `omit_trailing_type_words("insertObject", "Object") == Some("insert")`.
pub fn omit_trailing_type_words(name: &str, type_name: &str) -> Option<String> {
    let name_words = camel_case_words(name);
    let type_words = camel_case_words(type_name);
    let mut matched = 0;
    while matched < name_words.len() && matched < type_words.len() {
        let name_word = name_words[name_words.len() - 1 - matched];
        let type_word = type_words[type_words.len() - 1 - matched];
        if !word_implied_by(name_word, type_word) {
            break;
        }
        matched += 1;
    }
    if matched == 0 || matched == name_words.len() {
        return None;
    }
    let kept: String = name_words[..name_words.len() - matched].concat();
    is_acceptable_shortening(&kept).then_some(kept)
}

/// Drops a leading `<ResultType>By` run: `stringByAppendingString` with
/// result `NSString` becomes `appendingString`.
pub fn omit_leading_result_words(name: &str, result_type_name: &str) -> Option<String> {
    let name_words = camel_case_words(name);
    let type_words = camel_case_words(result_type_name);
    let by_index = name_words.iter().position(|word| *word == "By")?;
    if by_index == 0 || by_index > type_words.len() || by_index + 1 == name_words.len() {
        return None;
    }
    let leading = &name_words[..by_index];
    let type_tail = &type_words[type_words.len() - by_index..];
    if !leading.iter().zip(type_tail).all(|(name_word, type_word)| words_match(name_word, type_word)) {
        return None;
    }
    let rest: String = name_words[by_index + 1..].concat();
    let shortened = lowercase_first_word(&rest);
    is_acceptable_shortening(&shortened).then_some(shortened)
}
