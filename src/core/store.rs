use crate::{
    drag::WordRef,
    types::{Sentence, SentenceId},
};

/// Ordered in-play sentences. Ids are minted here and never handed out twice.
#[derive(Debug)]
pub struct SentenceStore {
    sentences: Vec<Sentence>,
    next_id: SentenceId,
}

impl Default for SentenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceStore {
    pub fn new() -> Self {
        Self {
            sentences: Vec::new(),
            next_id: 1,
        }
    }

    pub fn mint_id(&mut self) -> SentenceId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn as_slice(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sentence> {
        self.sentences.iter()
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    pub fn position(&self, id: SentenceId) -> Option<usize> {
        self.sentences.iter().position(|s| s.id == id)
    }

    pub fn find_mut(&mut self, id: SentenceId) -> Option<&mut Sentence> {
        self.sentences.iter_mut().find(|s| s.id == id)
    }

    pub fn push(&mut self, sentence: Sentence) {
        self.sentences.push(sentence);
    }

    pub fn remove(&mut self, index: usize) -> Option<Sentence> {
        (index < self.sentences.len()).then(|| self.sentences.remove(index))
    }

    pub fn remove_id(&mut self, id: SentenceId) -> Option<Sentence> {
        let index = self.position(id)?;
        self.remove(index)
    }

    pub fn clear(&mut self) {
        self.sentences.clear();
    }

    #[cfg(test)]
    pub fn total_words(&self) -> usize {
        self.sentences.iter().map(Sentence::len).sum()
    }

    /// Splices one word out of `source` and into `target_sentence`, before
    /// `target_index` (clamped) or at the end when it is `None`. Leaves the
    /// store untouched and returns false if any coordinate is out of range.
    pub fn move_word(
        &mut self,
        source: WordRef,
        target_sentence: usize,
        target_index: Option<usize>,
    ) -> bool {
        let in_range = self
            .sentences
            .get(source.sentence)
            .is_some_and(|s| source.word < s.len())
            && target_sentence < self.sentences.len();
        if !in_range {
            return false;
        }
        let word = self.sentences[source.sentence].words.remove(source.word);
        let target = &mut self.sentences[target_sentence].words;
        match target_index {
            Some(index) => target.insert(index.min(target.len()), word),
            None => target.push(word),
        }
        true
    }
}
