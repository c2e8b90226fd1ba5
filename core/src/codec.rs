//! Text encoding of a posting list for the keyed store:
//! `docId:offset` pairs joined by `,`, e.g. `0:0,0:1,4:2`.

use crate::error::{IndexError, Result};
use crate::{Posting, PostingList};

const PAIR_SEP: char = ',';
const FIELD_SEP: char = ':';

pub fn encode_postings(postings: &[Posting]) -> String {
    let mut out = String::with_capacity(postings.len() * 8);
    for (i, p) in postings.iter().enumerate() {
        if i > 0 {
            out.push(PAIR_SEP);
        }
        out.push_str(&p.doc_id.to_string());
        out.push(FIELD_SEP);
        out.push_str(&p.offset.to_string());
    }
    out
}

/// Decodes a stored value. `term` only labels errors.
pub fn decode_postings(term: &str, value: &[u8]) -> Result<PostingList> {
    let corrupt = |reason: String| IndexError::CorruptPostings { term: term.to_string(), reason };
    let text = std::str::from_utf8(value).map_err(|e| corrupt(e.to_string()))?;
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(PAIR_SEP)
        .map(|pair| {
            let (doc, offset) = pair
                .split_once(FIELD_SEP)
                .ok_or_else(|| corrupt(format!("pair {pair:?} has no '{FIELD_SEP}'")))?;
            let doc_id = doc.parse().map_err(|_| corrupt(format!("bad document id {doc:?}")))?;
            let offset = offset.parse().map_err(|_| corrupt(format!("bad offset {offset:?}")))?;
            Ok(Posting::new(doc_id, offset))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_pairs_in_order() {
        let list = vec![Posting::new(0, 0), Posting::new(0, 1), Posting::new(12, 7)];
        assert_eq!(encode_postings(&list), "0:0,0:1,12:7");
        assert_eq!(decode_postings("t", b"0:0,0:1,12:7").unwrap(), list);
    }

    #[test]
    fn empty_value_is_empty_list() {
        assert_eq!(encode_postings(&[]), "");
        assert!(decode_postings("t", b"").unwrap().is_empty());
    }

    #[test]
    fn malformed_values_name_the_term() {
        let err = decode_postings("Tokyo", b"0:0,3").unwrap_err();
        assert!(matches!(err, IndexError::CorruptPostings { ref term, .. } if term == "Tokyo"));
        assert!(decode_postings("t", b"a:1").is_err());
        assert!(decode_postings("t", b"1:-2").is_err());
        assert!(decode_postings("t", &[0xff, 0xfe]).is_err());
    }
}
