// SPDX-FileCopyrightText: 2026 Tenet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paragraph-packing chunker for learned documents.

/// Split `text` into chunks of at most `max_words` words.
///
/// Paragraphs (separated by blank lines) are packed greedily and joined with a
/// blank line. A paragraph longer than `max_words` is split on sentence
/// boundaries, and a sentence that is still too long on word boundaries.
pub fn chunk_content(text: &str, max_words: usize) -> Vec<String> {
    let max_words = max_words.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for paragraph in paragraphs(text) {
        let words = word_count(paragraph);
        if words > max_words {
            flush(&mut chunks, &mut current, &mut current_words);
            chunks.extend(split_oversized(paragraph, max_words));
            continue;
        }
        if current_words + words > max_words {
            flush(&mut chunks, &mut current, &mut current_words);
        }
        current.push(paragraph);
        current_words += words;
    }
    flush(&mut chunks, &mut current, &mut current_words);
    chunks
}

fn paragraphs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(text[s..end].trim());
            }
        } else {
            start.get_or_insert(offset);
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        out.push(text[s..end].trim());
    }
    out
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn flush(chunks: &mut Vec<String>, current: &mut Vec<&str>, words: &mut usize) {
    if !current.is_empty() {
        chunks.push(current.join("\n\n"));
        current.clear();
    }
    *words = 0;
}

fn split_oversized(paragraph: &str, max_words: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for sentence in sentences(paragraph) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if words.len() > max_words {
            if !current.is_empty() {
                out.push(current.join(" "));
                current.clear();
                current_words = 0;
            }
            out.extend(words.chunks(max_words).map(|w| w.join(" ")));
            continue;
        }
        if current_words + words.len() > max_words && !current.is_empty() {
            out.push(current.join(" "));
            current.clear();
            current_words = 0;
        }
        current_words += words.len();
        current.push(sentence);
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
    out
}

/// Sentences end at `.`, `!` or `?` followed by whitespace.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_break = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
            if at_break {
                let end = i + c.len_utf8();
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    out.push(sentence);
                }
                start = end;
            }
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(chunk_content("", 300).is_empty());
        assert!(chunk_content("  \n\n \n", 300).is_empty());
    }

    #[test]
    fn short_document_is_one_chunk() {
        let doc = "Rust has ownership.\n\nBorrowing is checked at compile time.";
        let chunks = chunk_content(doc, 300);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], doc);
    }

    #[test]
    fn paragraphs_pack_up_to_limit() {
        let doc = "one two three\n\nfour five\n\nsix seven eight nine";
        let chunks = chunk_content(doc, 5);
        assert_eq!(chunks, vec!["one two three\n\nfour five", "six seven eight nine"]);
    }

    #[test]
    fn oversized_paragraph_splits_on_sentences() {
        let doc = "First sentence here. Second sentence is here. Third one.";
        let chunks = chunk_content(doc, 4);
        assert_eq!(
            chunks,
            vec!["First sentence here.", "Second sentence is here.", "Third one."]
        );
    }

    #[test]
    fn run_on_sentence_splits_on_words() {
        let doc = "a b c d e f g";
        let chunks = chunk_content(doc, 3);
        assert_eq!(chunks, vec!["a b c", "d e f", "g"]);
    }

    #[test]
    fn decimal_points_do_not_end_sentences() {
        assert_eq!(sentences("Pi is 3.14 roughly. Yes!"), vec!["Pi is 3.14 roughly.", "Yes!"]);
    }

    proptest! {
        #[test]
        fn chunks_rejoin_to_original_paragraphs(
            paras in proptest::collection::vec(
                proptest::collection::vec("[a-z]{1,8}", 1..20).prop_map(|w| w.join(" ")),
                1..30,
            ),
            max_words in 20usize..60,
        ) {
            let doc = paras.join("\n\n");
            let chunks = chunk_content(&doc, max_words);
            let rejoined: Vec<String> = chunks
                .iter()
                .flat_map(|c| c.split("\n\n").map(str::to_string).collect::<Vec<_>>())
                .collect();
            prop_assert_eq!(rejoined, paras.clone());
            for chunk in &chunks {
                prop_assert!(word_count(chunk) <= max_words);
            }
            let total: usize = paras.iter().map(|p| word_count(p)).sum();
            if total > max_words {
                prop_assert!(chunks.len() > 1);
            }
        }
    }
}
