use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::Offset;

lazy_static! {
    // Whitespace, per-script runs for Japanese text, other letter/digit runs, then any single char.
    static ref SEGMENT_RE: Regex = Regex::new(
        r"\s+|\p{sc=Han}+|\p{sc=Hiragana}+|[\p{sc=Katakana}ー]+|[[\p{L}\p{N}_']--[\p{sc=Han}\p{sc=Hiragana}\p{sc=Katakana}ー]]+|."
    )
    .expect("valid regex");
}

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentClass {
    /// Kept as a term and assigned an offset.
    Word,
    /// Dropped from the token stream without consuming an offset.
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub surface: &'a str,
    pub class: SegmentClass,
}

impl<'a> Segment<'a> {
    fn word(surface: &'a str) -> Self {
        Self { surface, class: SegmentClass::Word }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub surface: String,
    pub offset: Offset,
}

/// Text segmentation capability shared by indexing and querying.
///
/// Implementations only decide where segments start and end and which
/// segments are boundaries; offsets are always assigned by [`Tokenizer::tokenize`]
/// as the rank among retained segments. Output must be deterministic.
pub trait Tokenizer: Send + Sync {
    fn segments<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Segment<'a>> + 'a>;

    fn tokenize<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Token> + 'a> {
        Box::new(
            self.segments(text)
                .filter(|s| s.class == SegmentClass::Word)
                .enumerate()
                .map(|(rank, s)| Token { surface: s.surface.to_string(), offset: rank as Offset }),
        )
    }
}

/// Splits on Unicode whitespace. Deterministic test double.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn segments<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Segment<'a>> + 'a> {
        Box::new(text.split_whitespace().map(Segment::word))
    }
}

/// Script-aware segmenter: Han, Hiragana and Katakana runs become separate
/// tokens, other letters and digits group into words, symbols stand alone.
/// Whitespace and sentence terminators are boundaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn segments<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Segment<'a>> + 'a> {
        Box::new(SEGMENT_RE.find_iter(text).map(|m| {
            let surface = m.as_str();
            let boundary = surface.chars().all(char::is_whitespace)
                || (surface.chars().count() == 1 && surface.starts_with(SENTENCE_TERMINATORS));
            let class = if boundary { SegmentClass::Boundary } else { SegmentClass::Word };
            Segment { surface, class }
        }))
    }
}

/// Fixed-width character n-grams inside each whitespace-delimited run.
#[derive(Debug, Clone, Copy)]
pub struct NgramTokenizer {
    n: usize,
}

impl NgramTokenizer {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(IndexError::Config("n-gram size must be at least 1".into()));
        }
        Ok(Self { n })
    }
}

fn ngrams(run: &str, n: usize) -> Vec<Segment<'_>> {
    let bounds: Vec<usize> = run.char_indices().map(|(i, _)| i).chain(std::iter::once(run.len())).collect();
    let chars = bounds.len() - 1;
    if chars <= n {
        return vec![Segment::word(run)];
    }
    (0..=chars - n).map(|i| Segment::word(&run[bounds[i]..bounds[i + n]])).collect()
}

impl Tokenizer for NgramTokenizer {
    fn segments<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Segment<'a>> + 'a> {
        let n = self.n;
        Box::new(text.split_whitespace().flat_map(move |run| ngrams(run, n)))
    }
}

/// Persisted choice of tokenizer; recorded with the index so queries are
/// segmented exactly as the documents were.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TokenizerKind {
    Whitespace,
    #[default]
    Word,
    Ngram { n: usize },
}

impl TokenizerKind {
    pub fn build(&self) -> Result<Box<dyn Tokenizer>> {
        Ok(match *self {
            TokenizerKind::Whitespace => Box::new(WhitespaceTokenizer),
            TokenizerKind::Word => Box::new(WordTokenizer),
            TokenizerKind::Ngram { n } => Box::new(NgramTokenizer::new(n)?),
        })
    }
}
