use crate::error::AnalysisError;

/// Lazy iterator over word-bounded chunks. Words are whitespace-delimited
/// tokens rejoined with single spaces; no word is ever split across chunks
/// and the chunks cover the word sequence exactly once, in order.
pub struct WordChunks<'a> {
    words: Vec<&'a str>,
    chunk_word_count: usize,
    cursor: usize,
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.cursor >= self.words.len() {
            return None;
        }

        let end = (self.cursor + self.chunk_word_count).min(self.words.len());
        let chunk = self.words[self.cursor..end].join(" ");
        self.cursor = end;
        Some(chunk)
    }
}

/// Split `text` into `ceil(words / chunk_word_count)` chunks. Empty text
/// yields no chunks. Restartable: calling again on the same input produces
/// the same sequence.
pub fn chunk_words(text: &str, chunk_word_count: usize) -> Result<WordChunks<'_>, AnalysisError> {
    if chunk_word_count == 0 {
        return Err(AnalysisError::InvalidChunkConfig(
            "chunk word count must be positive".to_string(),
        ));
    }

    Ok(WordChunks {
        words: text.split_whitespace().collect(),
        chunk_word_count,
        cursor: 0,
    })
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
