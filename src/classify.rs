//! Message classification heuristics
//!
//! Stateless predicates over a message body. A message can match any number
//! of categories; the recorder decides which counters each match feeds.

use regex::Regex;

const PROFANITIES: [&str; 10] = [
    "shit",
    "piss",
    "fuck",
    "cunt",
    "cocksucker",
    "turd",
    "twat",
    "asshole",
    "bitch",
    "pussy",
];

const VIOLENT_WORDS: [&str; 5] = ["smacks", "beats", "punches", "hits", "slaps"];

pub struct MessageClassifier {
    profanity: Regex,
    action: Regex,
    violence: Regex,
    smile: Regex,
    frown: Regex,
    word: Regex,
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageClassifier {
    pub fn new() -> Self {
        Self {
            profanity: Regex::new(&PROFANITIES.join("|")).expect("hard-coded pattern"),
            // CTCP ACTION framing: \x01ACTION ...\x01
            action: Regex::new("^\x01ACTION.*\x01$").expect("hard-coded pattern"),
            violence: Regex::new(&format!("^\x01ACTION ({})", VIOLENT_WORDS.join("|")))
                .expect("hard-coded pattern"),
            // Eyes, optional nose, then a happy or sad mouth.
            smile: Regex::new(r"[:;=8X][ ^o-]?[D)>pP\]}]").expect("hard-coded pattern"),
            frown: Regex::new(r"[:;=8X][ ^o-]?[(\[\\/{]").expect("hard-coded pattern"),
            word: Regex::new(r"[A-Za-z0-9'-]+").expect("hard-coded pattern"),
        }
    }

    pub fn is_profane(&self, message: &str) -> bool {
        self.profanity.is_match(message)
    }

    pub fn is_action(&self, message: &str) -> bool {
        self.action.is_match(message)
    }

    pub fn is_violent_action(&self, message: &str) -> bool {
        self.violence.is_match(message)
    }

    pub fn is_question(&self, message: &str) -> bool {
        message.contains('?')
    }

    pub fn is_shouting(&self, message: &str) -> bool {
        message.contains('!')
    }

    /// All caps lock, and not just a short smiley like ":D".
    pub fn is_all_caps(&self, message: &str) -> bool {
        let letters = message.chars().filter(|c| c.is_ascii_uppercase()).count();
        letters > 2 && message.to_uppercase() == message
    }

    pub fn is_smile(&self, message: &str) -> bool {
        self.smile.is_match(message)
    }

    pub fn is_frown(&self, message: &str) -> bool {
        self.frown.is_match(message)
    }

    /// Word count where digits are valid word characters ("3pm" is one word).
    pub fn word_count(&self, message: &str) -> u64 {
        self.word.find_iter(message).count() as u64
    }
}
