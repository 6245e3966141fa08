//! Tokenizer for granted payloads.
//!
//! Each payload line holds comma-separated words. Two terminators stop
//! consumption: a line that is exactly `$$`, and an `EOF` token anywhere in
//! a line. Tokens after a terminator are never returned.

use crate::wire::{END_OF_FILE, STREAM_END, WORD_SEPARATOR};

/// Why consumption of a payload stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `$$` line: the arbiter has no more data for anyone.
    StreamEnd,

    /// `EOF` token: this station's transfer is complete.
    EndOfFile,
}

/// Words extracted from one granted reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Words in arrival order, terminators excluded.
    pub words: Vec<String>,

    /// Set when a terminator was seen.
    pub terminator: Option<Terminator>,
}

impl Payload {
    /// Tokenize payload lines.
    ///
    /// Whitespace around tokens is trimmed and empty tokens are skipped.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut payload = Payload::default();

        for line in lines {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);

            if line.trim() == STREAM_END {
                payload.terminator = Some(Terminator::StreamEnd);
                return payload;
            }

            for token in line.split(WORD_SEPARATOR) {
                let word = token.trim();
                if word.is_empty() {
                    continue;
                }
                if word == END_OF_FILE {
                    payload.terminator = Some(Terminator::EndOfFile);
                    return payload;
                }
                payload.words.push(word.to_string());
            }
        }

        payload
    }

    /// Whether consumption must stop after this payload.
    pub fn is_terminal(&self) -> bool {
        self.terminator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_then_eof() {
        let payload = Payload::parse(["dog,cat", "EOF"]);
        assert_eq!(payload.words, vec!["dog", "cat"]);
        assert_eq!(payload.terminator, Some(Terminator::EndOfFile));
    }

    #[test]
    fn test_eof_mid_line_drops_trailing_tokens() {
        let payload = Payload::parse(["a,EOF,b", "c"]);
        assert_eq!(payload.words, vec!["a"]);
        assert_eq!(payload.terminator, Some(Terminator::EndOfFile));
    }

    #[test]
    fn test_stream_end_alone() {
        let payload = Payload::parse(["$$"]);
        assert!(payload.words.is_empty());
        assert_eq!(payload.terminator, Some(Terminator::StreamEnd));
        assert!(payload.is_terminal());
    }

    #[test]
    fn test_stream_end_after_data() {
        let payload = Payload::parse(["x,y", "$$", "z"]);
        assert_eq!(payload.words, vec!["x", "y"]);
        assert_eq!(payload.terminator, Some(Terminator::StreamEnd));
    }

    #[test]
    fn test_dollar_token_inside_line_is_a_word() {
        // Only a whole line of "$$" ends the stream
        let payload = Payload::parse(["a,$$"]);
        assert_eq!(payload.words, vec!["a", "$$"]);
        assert!(payload.terminator.is_none());
    }

    #[test]
    fn test_trims_and_skips_empty_tokens() {
        let payload = Payload::parse(["  dog , ,cat,\r"]);
        assert_eq!(payload.words, vec!["dog", "cat"]);
        assert!(!payload.is_terminal());
    }

    #[test]
    fn test_repeated_words_are_kept() {
        let payload = Payload::parse(["cat,dog,cat"]);
        assert_eq!(payload.words, vec!["cat", "dog", "cat"]);
    }
}
