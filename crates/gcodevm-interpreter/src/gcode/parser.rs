//! G-Code line parser
//!
//! Turns one raw source line into an ordered list of words. Parsing never
//! fails: malformed segments are skipped so the VM tolerates near-valid files.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A single `<letter><number>` word
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Uppercase word letter
    pub letter: char,
    /// Numeric value
    pub value: f64,
}

impl Word {
    /// Create a word, normalizing the letter to uppercase
    pub fn new(letter: char, value: f64) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            value,
        }
    }

    /// Value in tenths, so `G28.1` compares as `281` and `G1` as `10`
    pub fn code(&self) -> i32 {
        to_code(self.value)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.value)
    }
}

/// Convert a word value into tenths for exact code comparisons
pub fn to_code(value: f64) -> i32 {
    (value * 10.0).round() as i32
}

/// Render a code in tenths back into its G-code spelling, e.g. `G38.2`
pub fn format_code(letter: char, code: i32) -> String {
    if code % 10 == 0 {
        format!("{}{}", letter, code / 10)
    } else {
        format!("{}{}.{}", letter, code / 10, (code % 10).abs())
    }
}

/// One parsed source line
///
/// Immutable once constructed. Words keep their encounter order and a letter
/// may appear more than once (several `T` or `G` words on one line are legal).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedLine {
    source: String,
    code: String,
    words: Vec<Word>,
}

impl ParsedLine {
    /// Parse a raw G-code line
    pub fn parse(raw: &str) -> Self {
        let code = strip_comments(raw).trim().to_string();
        let words = word_regex()
            .captures_iter(&code)
            .filter_map(|caps| {
                let letter = caps.get(1)?.as_str().chars().next()?;
                let value = caps.get(2)?.as_str().parse::<f64>().ok()?;
                value.is_finite().then(|| Word::new(letter, value))
            })
            .collect();

        Self {
            source: raw.to_string(),
            code,
            words,
        }
    }

    /// Build a line directly from words (used by tests and generators)
    pub fn from_words(words: Vec<Word>) -> Self {
        let code = words
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            source: code.clone(),
            code,
            words,
        }
    }

    /// The original source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source text with comments removed and whitespace trimmed
    pub fn code(&self) -> &str {
        &self.code
    }

    /// All words in encounter order
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// True if the line carries no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Check if a word letter is present
    pub fn has(&self, letter: char) -> bool {
        let letter = letter.to_ascii_uppercase();
        self.words.iter().any(|w| w.letter == letter)
    }

    /// First value for a letter
    pub fn get(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .find(|w| w.letter == letter)
            .map(|w| w.value)
    }

    /// First value for a letter, or `default` when absent
    pub fn get_or(&self, letter: char, default: f64) -> f64 {
        self.get(letter).unwrap_or(default)
    }

    /// Every value for a letter, in encounter order
    pub fn get_all(&self, letter: char) -> Vec<f64> {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .filter(|w| w.letter == letter)
            .map(|w| w.value)
            .collect()
    }

    /// Codes (in tenths) for every occurrence of a letter
    pub fn codes(&self, letter: char) -> impl Iterator<Item = i32> + '_ {
        let letter = letter.to_ascii_uppercase();
        self.words
            .iter()
            .filter(move |w| w.letter == letter)
            .map(Word::code)
    }

    /// Check for a specific code such as `('G', 28.1)` or `('L', 20.0)`
    pub fn has_code(&self, letter: char, value: f64) -> bool {
        let wanted = to_code(value);
        self.codes(letter).any(|c| c == wanted)
    }

    /// Word letters in encounter order, repeats included
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.words.iter().map(|w| w.letter)
    }

    /// True if the comment-free text matches the invalid G-code pattern
    pub fn is_invalid(&self) -> bool {
        is_invalid_gcode(&self.code)
    }
}

impl FromStr for ParsedLine {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ParsedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Parse a raw G-code line
pub fn parse_line(raw: &str) -> ParsedLine {
    ParsedLine::parse(raw)
}

/// Remove `( ... )` and `; ...` comments
///
/// An unterminated parenthesis comments out the rest of the line.
pub fn strip_comments(line: &str) -> Cow<'_, str> {
    static COMMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COMMENT_REGEX
        .get_or_init(|| Regex::new(r"\([^)]*(?:\)|$)|;.*").expect("invalid regex pattern"));
    regex.replace_all(line, " ")
}

/// Check comment-free text against the invalid G-code pattern
///
/// Flags any character outside `NGMXYZIJKFRS%0-9.-?` and whitespace
/// (case-insensitive), and the `G28`, `G29` and `$H` commands.
pub fn is_invalid_gcode(text: &str) -> bool {
    static INVALID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = INVALID_REGEX.get_or_init(|| {
        Regex::new(r"(?i)[^NGMXYZIJKFRS%\-?.\d\s]|G28|G29|\$H").expect("invalid regex pattern")
    });
    regex.is_match(text)
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"(?i)([A-Z])\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").expect("invalid regex pattern")
    })
}
