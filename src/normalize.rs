//! Text normalization for speech synthesis.
//!
//! Raw chat text is full of things a TTS voice reads badly: emoji, texting
//! slang, shouted caps, stacked punctuation. [`TextNormalizer`] applies a
//! fixed-order rewrite pipeline to turn a message into something speakable.
//! Each stage is idempotent, so normalizing twice yields the same output.
//!
//! Stage order matters: slang expansion assumes emoji are already gone, and
//! the ALL-CAPS lowering stage must run after the phonetic uppercasing stage
//! so its exemption set lines up.

use std::collections::HashSet;

use anyhow::Result;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Casual abbreviations expanded to full phrases (whole-word, case-insensitive).
/// `bc` is context-gated and handled separately.
const SLANG_EXPANSIONS: &[(&str, &str)] = &[
    ("idk", "I don't know"),
    ("btw", "by the way"),
    ("omw", "on my way"),
    ("brb", "be right back"),
    ("tbh", "to be honest"),
    ("imo", "in my opinion"),
    ("imho", "in my humble opinion"),
    ("fyi", "for your information"),
    ("nvm", "never mind"),
    ("rn", "right now"),
    ("ty", "thank you"),
    ("thx", "thanks"),
    ("np", "no problem"),
];

/// Abbreviations the TTS engine mispronounces unless spelled in caps.
const PHONETIC_UPPERCASE: &[&str] = &[
    "ok", "tv", "ai", "usa", "fbi", "nasa", "gps", "diy", "ceo", "asap",
];

/// Recognized slang left in its original case by the ALL-CAPS lowering stage.
const SPOKEN_AS_IS: &[&str] = &["LOL", "OMG", "LMAO", "ROFL", "WTF", "SMH"];

/// Staged rewrite pipeline that turns raw chat text into TTS-ready text.
pub struct TextNormalizer {
    slang: Vec<(Regex, &'static str)>,
    bc_regex: Regex,
    phonetic: Vec<(Regex, &'static str)>,
    repeated_bangs: Regex,
    repeated_questions: Regex,
    shouted_word: Regex,
    extra_spaces: Regex,
    known_caps: HashSet<&'static str>,
}

impl TextNormalizer {
    /// Compile the stage regexes.
    pub fn new() -> Result<Self> {
        let mut slang = Vec::with_capacity(SLANG_EXPANSIONS.len());
        for (token, expansion) in SLANG_EXPANSIONS {
            let re = Regex::new(&format!(r"(?i)\b{token}\b"))
                .map_err(|e| anyhow::anyhow!("Failed to compile slang regex: {e}"))?;
            slang.push((re, *expansion));
        }

        let bc_regex = Regex::new(r"(?i)\bbc\b")
            .map_err(|e| anyhow::anyhow!("Failed to compile bc regex: {e}"))?;

        let mut phonetic = Vec::with_capacity(PHONETIC_UPPERCASE.len());
        let mut known_caps: HashSet<&'static str> = SPOKEN_AS_IS.iter().copied().collect();
        for token in PHONETIC_UPPERCASE {
            let re = Regex::new(&format!(r"(?i)\b{token}\b"))
                .map_err(|e| anyhow::anyhow!("Failed to compile phonetic regex: {e}"))?;
            // Leak-free: the caps forms of the fixed table are themselves static
            phonetic.push((re, caps_form(token)));
            known_caps.insert(caps_form(token));
        }

        let repeated_bangs = Regex::new(r"!{2,}")
            .map_err(|e| anyhow::anyhow!("Failed to compile punctuation regex: {e}"))?;
        let repeated_questions = Regex::new(r"\?{2,}")
            .map_err(|e| anyhow::anyhow!("Failed to compile punctuation regex: {e}"))?;
        let shouted_word = Regex::new(r"\b[A-Z]{4,}\b")
            .map_err(|e| anyhow::anyhow!("Failed to compile caps regex: {e}"))?;
        let extra_spaces = Regex::new(r"\s+")
            .map_err(|e| anyhow::anyhow!("Failed to compile spaces regex: {e}"))?;

        Ok(Self {
            slang,
            bc_regex,
            phonetic,
            repeated_bangs,
            repeated_questions,
            shouted_word,
            extra_spaces,
            known_caps,
        })
    }

    /// Run the full pipeline over `text`.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let text = text.nfc().collect::<String>();

        let text = strip_emoji(&text);
        let text = self.expand_slang(&text);
        let text = self.uppercase_phonetic(&text);
        let text = self.dedup_punctuation(&text);
        let text = self.lower_shouted_words(&text);

        self.extra_spaces.replace_all(&text, " ").trim().to_string()
    }

    /// Stage 2: expand the closed slang dictionary, whole-word and
    /// case-insensitive. `bc` only expands outside calendar-era contexts.
    fn expand_slang(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (re, expansion) in &self.slang {
            result = re.replace_all(&result, *expansion).into_owned();
        }
        self.expand_bc(&result)
    }

    /// Expand `bc` to "because" unless preceded by a numeral or the word
    /// "century", which marks a calendar-era reference like "300 bc".
    fn expand_bc(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut last_end = 0;
        for m in self.bc_regex.find_iter(text) {
            result.push_str(&text[last_end..m.start()]);
            if is_calendar_era(&text[..m.start()]) {
                result.push_str(m.as_str());
            } else {
                result.push_str("because");
            }
            last_end = m.end();
        }
        result.push_str(&text[last_end..]);
        result
    }

    /// Stage 3: spell out abbreviations the voice reads phonetically.
    fn uppercase_phonetic(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (re, caps) in &self.phonetic {
            result = re.replace_all(&result, *caps).into_owned();
        }
        result
    }

    /// Stage 4: collapse runs of `!` and `?`. Ellipses stay untouched since
    /// they render as a natural pause.
    fn dedup_punctuation(&self, text: &str) -> String {
        let text = self.repeated_bangs.replace_all(text, "!");
        self.repeated_questions.replace_all(&text, "?").into_owned()
    }

    /// Stage 5: lowercase shouted words of four or more letters, except
    /// abbreviations in the known-caps set.
    fn lower_shouted_words(&self, text: &str) -> String {
        self.shouted_word
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let word = caps.get(0).map_or("", |m| m.as_str());
                if self.known_caps.contains(word) {
                    word.to_string()
                } else {
                    word.to_lowercase()
                }
            })
            .into_owned()
    }
}

/// Map a phonetic table entry to its static all-caps form.
fn caps_form(token: &str) -> &'static str {
    match token {
        "ok" => "OK",
        "tv" => "TV",
        "ai" => "AI",
        "usa" => "USA",
        "fbi" => "FBI",
        "nasa" => "NASA",
        "gps" => "GPS",
        "diy" => "DIY",
        "ceo" => "CEO",
        "asap" => "ASAP",
        _ => "",
    }
}

/// True when the text preceding a `bc` token ends with "<numeral> " or
/// "century " (case-insensitive).
fn is_calendar_era(prefix: &str) -> bool {
    if !prefix.ends_with(' ') {
        return false;
    }
    let before = prefix[..prefix.len() - 1].trim_end_matches(|c: char| c.is_whitespace());
    if before.chars().last().is_some_and(|c| c.is_ascii_digit()) {
        return true;
    }
    before
        .rsplit(|c: char| !c.is_alphabetic())
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("century"))
}

/// Stage 1: delete emoji and pictographic code points with no replacement.
fn strip_emoji(text: &str) -> String {
    text.chars().filter(|c| !is_emoji_char(*c)).collect()
}

/// Fixed set of Unicode ranges covering emoticons, pictographs, transport
/// symbols, flags, dingbats, variation selectors, and zero-width joiners.
const fn is_emoji_char(c: char) -> bool {
    matches!(c,
        '\u{1F300}'..='\u{1F5FF}'   // symbols & pictographs
        | '\u{1F600}'..='\u{1F64F}' // emoticons
        | '\u{1F680}'..='\u{1F6FF}' // transport & map symbols
        | '\u{1F900}'..='\u{1F9FF}' // supplemental symbols
        | '\u{1F1E6}'..='\u{1F1FF}' // regional indicators (flags)
        | '\u{2600}'..='\u{26FF}'   // miscellaneous symbols
        | '\u{2700}'..='\u{27BF}'   // dingbats
        | '\u{FE00}'..='\u{FE0F}'   // variation selectors
        | '\u{200D}'                // zero-width joiner
    )
}
