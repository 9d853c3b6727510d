// Free-text plumbing: typo correction, cleaning and the lexicon-based
// sentiment classifier.

use std::collections::{HashMap, HashSet};

use leadership_scoring::Sentiment;

/// Replaces known misspellings word by word. Unknown words pass through
/// unchanged.
pub fn correct_typos(text: &str, corrections: &HashMap<String, String>) -> String {
    text.split_whitespace()
        .map(|w| corrections.get(w).map(String::as_str).unwrap_or(w))
        .collect::<Vec<&str>>()
        .join(" ")
}

/// Lowercases and strips everything but letters (Portuguese diacritics
/// included) and spaces, collapsing runs of whitespace. Applied after
/// typo correction.
pub fn clean_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = true;
    for c in lowered.chars() {
        if c.is_alphabetic() {
            out.push(c);
            last_was_space = false;
        } else if c.is_whitespace() && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Maps a precomputed sentiment label to the core enum. Accepts the
/// survey's Portuguese labels and their English equivalents.
pub fn parse_sentiment_label(label: &str) -> Option<Sentiment> {
    match label.trim() {
        "Positivo" | "Positive" => Some(Sentiment::Positive),
        "Negativo" | "Negative" => Some(Sentiment::Negative),
        "Neutro" | "Neutral" => Some(Sentiment::Neutral),
        _ => None,
    }
}

/// Word-count sentiment over fixed positive/negative word lists. Ties
/// and empty text are Neutral.
pub struct SentimentLexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl SentimentLexicon {
    pub fn new(positive: &[String], negative: &[String]) -> SentimentLexicon {
        SentimentLexicon {
            positive: positive.iter().cloned().collect(),
            negative: negative.iter().cloned().collect(),
        }
    }

    /// Classifies already-cleaned text.
    pub fn classify(&self, cleaned_text: &str) -> Sentiment {
        if cleaned_text.trim().is_empty() {
            return Sentiment::Neutral;
        }
        let mut pos = 0usize;
        let mut neg = 0usize;
        for word in cleaned_text.split_whitespace() {
            if self.positive.contains(word) {
                pos += 1;
            }
            if self.negative.contains(word) {
                neg += 1;
            }
        }
        if pos > neg {
            Sentiment::Positive
        } else if neg > pos {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> SentimentLexicon {
        let positive: Vec<String> = ["aprender", "oportunidade", "contribuir"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let negative: Vec<String> = ["medo", "dúvidas", "difícil"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        SentimentLexicon::new(&positive, &negative)
    }

    #[test]
    fn typos_are_corrected_word_by_word() {
        let corrections: HashMap<String, String> =
            [("progamação", "programação"), ("experiecia", "experiência")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        assert_eq!(
            correct_typos("quero aprender progamação", &corrections),
            "quero aprender programação"
        );
        assert_eq!(correct_typos("", &corrections), "");
    }

    #[test]
    fn cleaning_keeps_portuguese_letters_only() {
        assert_eq!(
            clean_text("Aprender  Programação, em 2024!"),
            "aprender programação em"
        );
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn lexicon_counts_decide_the_label() {
        let lex = lexicon();
        assert_eq!(
            lex.classify("quero aprender e contribuir apesar do medo"),
            Sentiment::Positive
        );
        assert_eq!(lex.classify("tenho medo e dúvidas"), Sentiment::Negative);
        // One positive against one negative is a tie.
        assert_eq!(lex.classify("aprender é difícil"), Sentiment::Neutral);
        assert_eq!(lex.classify(""), Sentiment::Neutral);
        assert_eq!(lex.classify("palavras sem polaridade"), Sentiment::Neutral);
    }

    #[test]
    fn sentiment_labels_parse_in_both_languages() {
        assert_eq!(parse_sentiment_label("Positivo"), Some(Sentiment::Positive));
        assert_eq!(parse_sentiment_label(" Neutral "), Some(Sentiment::Neutral));
        assert_eq!(parse_sentiment_label("N/A"), None);
    }
}
