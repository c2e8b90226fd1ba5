use crate::tokenizer::Tokenizer;
use crate::{Document, Offset};

/// Tokenize one document into `(term, offset)` occurrences, title first.
///
/// Title and text are segmented as one stream joined by a line break so the
/// last title token never fuses with the first body token. Every retained
/// token becomes a term verbatim; repeated terms yield repeated entries.
pub fn build_postings(tokenizer: &dyn Tokenizer, document: &Document) -> Vec<(String, Offset)> {
    let mut combined = String::with_capacity(document.title.len() + 1 + document.text.len());
    combined.push_str(&document.title);
    combined.push('\n');
    combined.push_str(&document.text);
    tokenizer.tokenize(&combined).map(|tok| (tok.surface, tok.offset)).collect()
}
