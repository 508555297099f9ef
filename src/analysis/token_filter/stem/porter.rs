//! Porter stemming algorithm implementation.
//!
//! The stemmer applies the classic rewrite steps:
//! 1. Plurals and -ed/-ing suffixes, terminal y → i
//! 2. -ational → -ate, -tional → -tion, etc.
//! 3. -icate → -ic, -ative → "", etc.
//! 4. Remove -al, -ance, -ence, etc.
//! 5. Remove final -e and reduce -ll
//!
//! Words that are not pure ASCII are returned lowercased but otherwise
//! untouched.
//!
//! This is the original 1980 algorithm without the NLTK extensions: a short
//! vowel-consonant stem is not treated as cvc, so "are" stems to "ar" rather
//! than staying "are".
//!
//! # Examples
//!
//! ```
//! use spimi::analysis::token_filter::stem::Stemmer;
//! use spimi::analysis::token_filter::stem::porter::PorterStemmer;
//!
//! let stemmer = PorterStemmer::new();
//!
//! assert_eq!(stemmer.stem("running"), "run");
//! assert_eq!(stemmer.stem("flies"), "fli");
//! assert_eq!(stemmer.stem("relational"), "relat");
//! ```

use crate::analysis::token_filter::stem::Stemmer;

const STEP2_RULES: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("izer", "ize"),
    ("abli", "able"),
    ("alli", "al"),
    ("entli", "ent"),
    ("eli", "e"),
    ("ousli", "ous"),
    ("ization", "ize"),
    ("ation", "ate"),
    ("ator", "ate"),
    ("alism", "al"),
    ("iveness", "ive"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("biliti", "ble"),
];

const STEP3_RULES: &[(&str, &str)] = &[
    ("icate", "ic"),
    ("ative", ""),
    ("alize", "al"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
];

// Longer suffixes precede their own tails (ement, ment, ent).
const STEP4_SUFFIXES: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion", "ou",
    "ism", "ate", "iti", "ous", "ive", "ize",
];

/// Porter stemming algorithm for English words.
#[derive(Debug, Clone, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    /// Create a new Porter stemmer.
    pub fn new() -> Self {
        PorterStemmer
    }

    fn is_consonant(word: &[u8], pos: usize) -> bool {
        match word[pos] {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => pos == 0 || !Self::is_consonant(word, pos - 1),
            _ => true,
        }
    }

    /// Number of vowel-consonant sequences in `word`.
    fn measure(word: &[u8]) -> usize {
        let n = word.len();
        let mut i = 0;
        let mut m = 0;

        while i < n && Self::is_consonant(word, i) {
            i += 1;
        }

        loop {
            while i < n && !Self::is_consonant(word, i) {
                i += 1;
            }
            if i >= n {
                return m;
            }
            while i < n && Self::is_consonant(word, i) {
                i += 1;
            }
            m += 1;
        }
    }

    fn contains_vowel(word: &[u8]) -> bool {
        (0..word.len()).any(|i| !Self::is_consonant(word, i))
    }

    fn ends_with_double_consonant(word: &[u8]) -> bool {
        let n = word.len();
        n >= 2 && word[n - 1] == word[n - 2] && Self::is_consonant(word, n - 1)
    }

    /// Consonant-vowel-consonant ending where the last consonant is not w, x or y.
    fn ends_cvc(word: &[u8]) -> bool {
        let n = word.len();
        n >= 3
            && Self::is_consonant(word, n - 3)
            && !Self::is_consonant(word, n - 2)
            && Self::is_consonant(word, n - 1)
            && !matches!(word[n - 1], b'w' | b'x' | b'y')
    }

    fn stem_of<'a>(word: &'a [u8], suffix: &str) -> Option<&'a [u8]> {
        word.strip_suffix(suffix.as_bytes())
    }

    fn replace(word: &mut Vec<u8>, suffix_len: usize, replacement: &str) {
        word.truncate(word.len() - suffix_len);
        word.extend_from_slice(replacement.as_bytes());
    }

    fn step1a(word: &mut Vec<u8>) {
        if word.ends_with(b"sses") || word.ends_with(b"ies") {
            word.truncate(word.len() - 2);
        } else if word.ends_with(b"s") && !word.ends_with(b"ss") {
            word.pop();
        }
    }

    fn step1b(word: &mut Vec<u8>) {
        if let Some(stem) = Self::stem_of(word, "eed") {
            if Self::measure(stem) > 0 {
                word.pop();
            }
            return;
        }

        let stripped = ["ed", "ing"].iter().find_map(|suffix| {
            Self::stem_of(word, suffix)
                .filter(|stem| Self::contains_vowel(stem))
                .map(|stem| stem.len())
        });
        let Some(stem_len) = stripped else {
            return;
        };
        word.truncate(stem_len);

        if word.ends_with(b"at") || word.ends_with(b"bl") || word.ends_with(b"iz") {
            word.push(b'e');
        } else if Self::ends_with_double_consonant(word)
            && !matches!(word.last(), Some(b'l' | b's' | b'z'))
        {
            word.pop();
        } else if Self::measure(word) == 1 && Self::ends_cvc(word) {
            word.push(b'e');
        }
    }

    fn step1c(word: &mut [u8]) {
        if let Some(stem) = Self::stem_of(word, "y") {
            if Self::contains_vowel(stem) {
                let last = word.len() - 1;
                word[last] = b'i';
            }
        }
    }

    fn apply_rules(word: &mut Vec<u8>, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if let Some(stem) = Self::stem_of(word, suffix) {
                if Self::measure(stem) > 0 {
                    Self::replace(word, suffix.len(), replacement);
                }
                return;
            }
        }
    }

    fn step4(word: &mut Vec<u8>) {
        for suffix in STEP4_SUFFIXES {
            if let Some(stem) = Self::stem_of(word, suffix) {
                let ion_ok = *suffix != "ion" || matches!(stem.last(), Some(b's' | b't'));
                if ion_ok && Self::measure(stem) > 1 {
                    let stem_len = stem.len();
                    word.truncate(stem_len);
                }
                return;
            }
        }
    }

    fn step5(word: &mut Vec<u8>) {
        if let Some(stem) = Self::stem_of(word, "e") {
            let m = Self::measure(stem);
            if m > 1 || (m == 1 && !Self::ends_cvc(stem)) {
                word.pop();
            }
        }

        if word.ends_with(b"ll") && Self::measure(word) > 1 {
            word.pop();
        }
    }
}

impl Stemmer for PorterStemmer {
    fn stem(&self, word: &str) -> String {
        let lowered = word.to_lowercase();
        if lowered.len() <= 2 || !lowered.is_ascii() {
            return lowered;
        }

        let mut bytes = lowered.into_bytes();
        Self::step1a(&mut bytes);
        Self::step1b(&mut bytes);
        Self::step1c(&mut bytes);
        Self::apply_rules(&mut bytes, STEP2_RULES);
        Self::apply_rules(&mut bytes, STEP3_RULES);
        Self::step4(&mut bytes);
        Self::step5(&mut bytes);

        // Only ASCII bytes were removed or appended.
        String::from_utf8(bytes).unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "porter"
    }
}
