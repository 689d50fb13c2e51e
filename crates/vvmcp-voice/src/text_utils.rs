//! Text chunking for TTS.
//!
//! Splits text into sentence-sized chunks no longer than a configured
//! character count, so each engine call stays short and playback can start
//! before the whole text has been synthesized.

/// Characters that always end a sentence.
const FULL_WIDTH_TERMINATORS: &[char] = &['。', '．', '！', '？'];

/// ASCII characters that end a sentence when followed by whitespace or the
/// end of the text (so `3.14` and `v1.2` stay intact).
const ASCII_TERMINATORS: &[char] = &['.', '!', '?'];

/// Trailing characters absorbed into the sentence they close.
const CLOSERS: &[char] = &['」', '』', '）', ')', '"', '\'', '”', '’'];

/// Clause separators that also count as clean cut points inside an
/// over-long sentence.
const CLAUSE_BREAKS: &[char] = &['、', '，', ',', '；', ';', '：', ':', '\n'];

/// Whether `c` is sentence-terminal punctuation.
#[must_use]
pub fn is_sentence_terminator(c: char) -> bool {
    FULL_WIDTH_TERMINATORS.contains(&c) || ASCII_TERMINATORS.contains(&c)
}

/// Split text into ordered chunks of at most `max_len` characters.
///
/// Text is first split into sentences at terminal punctuation (the
/// punctuation stays with its sentence). Text with no terminal punctuation is
/// a single sentence. A sentence longer than `max_len` is cut greedily: the
/// last boundary character between `max_len / 2` and `max_len` wins, and
/// without one the sentence is hard-cut at exactly `max_len`.
///
/// Chunks are trimmed and never empty. Lengths count Unicode scalar values,
/// not bytes. A `max_len` of 0 is treated as 1.
#[must_use]
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();

    for sentence in split_sentences(text) {
        if sentence.chars().count() <= max_len {
            chunks.push(sentence);
        } else {
            split_long_sentence(&sentence, max_len, &mut chunks);
        }
    }

    chunks
}

// ── Internal helpers ───────────────────────────────────────────────

/// Split text into trimmed, non-empty sentences.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let ends_sentence = if FULL_WIDTH_TERMINATORS.contains(&c) {
            true
        } else if ASCII_TERMINATORS.contains(&c) {
            chars.peek().is_none_or(|next| {
                next.is_whitespace() || is_sentence_terminator(*next) || CLOSERS.contains(next)
            })
        } else {
            false
        };

        if ends_sentence {
            // Keep runs like "！？" or "。」" with the sentence they close.
            while let Some(&next) = chars.peek() {
                if is_sentence_terminator(next) || CLOSERS.contains(&next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }

    push_trimmed(&mut sentences, &current);
    sentences
}

/// Cut an over-long sentence into pieces of at most `max_len` characters.
fn split_long_sentence(sentence: &str, max_len: usize, out: &mut Vec<String>) {
    let chars: Vec<char> = sentence.chars().collect();
    let mut start = 0;

    while chars.len() - start > max_len {
        let window_end = start + max_len;
        let floor = start + max_len / 2;

        let cut = (floor..window_end)
            .rev()
            .find(|&i| is_boundary(chars[i]))
            .map_or(window_end, |i| i + 1);

        let piece: String = chars[start..cut].iter().collect();
        push_trimmed(out, &piece);
        start = cut;
    }

    let rest: String = chars[start..].iter().collect();
    push_trimmed(out, &rest);
}

fn is_boundary(c: char) -> bool {
    is_sentence_terminator(c) || CLAUSE_BREAKS.contains(&c)
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
