mod data;

use std::collections::HashMap;

use rand::{Rng, seq::SliceRandom};

use crate::types::{Sentence, SentenceId, Word};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThoughtKind {
    Bother,
    Calming,
    Worrying,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Empty,
    Jumble,
    Bother,
    Calming,
    Worrying,
}

impl From<ThoughtKind> for Classification {
    fn from(kind: ThoughtKind) -> Self {
        match kind {
            ThoughtKind::Bother => Classification::Bother,
            ThoughtKind::Calming => Classification::Calming,
            ThoughtKind::Worrying => Classification::Worrying,
        }
    }
}

/// Runs when a matched sentence settles. Effects only queue commands; the
/// controller applies them once the effect has returned.
pub type Effect = fn(&Sentence, &mut Effects);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Remove(SentenceId),
    Replace {
        id: SentenceId,
        template: &'static str,
    },
    Spawn(&'static str),
    SpawnRandom,
}

#[derive(Debug, Default)]
pub struct Effects {
    commands: Vec<Command>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, id: SentenceId) {
        self.commands.push(Command::Remove(id));
    }

    pub fn replace(&mut self, id: SentenceId, template: &'static str) {
        self.commands.push(Command::Replace { id, template });
    }

    pub fn spawn(&mut self, template: &'static str) {
        self.commands.push(Command::Spawn(template));
    }

    pub fn spawn_random(&mut self) {
        self.commands.push(Command::SpawnRandom);
    }

    #[cfg(test)]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

fn remove_sentence(sentence: &Sentence, effects: &mut Effects) {
    effects.remove(sentence.id);
}

/// One row of the static thought table.
#[derive(Clone, Copy)]
pub struct ThoughtDef {
    pub text: &'static str,
    pub kind: ThoughtKind,
    pub effect: Option<Effect>,
}

impl ThoughtDef {
    pub const fn bother(text: &'static str) -> Self {
        Self {
            text,
            kind: ThoughtKind::Bother,
            effect: None,
        }
    }

    pub const fn calming(text: &'static str) -> Self {
        Self {
            text,
            kind: ThoughtKind::Calming,
            effect: None,
        }
    }

    pub const fn worrying(text: &'static str) -> Self {
        Self {
            text,
            kind: ThoughtKind::Worrying,
            effect: None,
        }
    }

    pub const fn with_effect(self, effect: Effect) -> Self {
        Self {
            effect: Some(effect),
            ..self
        }
    }
}

struct Thought {
    kind: ThoughtKind,
    template: Vec<Word>,
    effect: Effect,
}

/// Immutable mapping from canonical sentence text to a thought.
pub struct Dictionary {
    thoughts: HashMap<&'static str, Thought>,
    bothers: Vec<&'static str>,
}

impl Dictionary {
    pub fn standard() -> Self {
        Self::from_table(data::THOUGHTS)
    }

    pub fn from_table(rows: &[ThoughtDef]) -> Self {
        let mut thoughts = HashMap::with_capacity(rows.len());
        let mut bothers = Vec::new();
        for row in rows {
            let template: Vec<Word> = row.text.split_whitespace().map(Word::new).collect();
            assert!(!template.is_empty(), "thought text must not be empty");
            let previous = thoughts.insert(
                row.text,
                Thought {
                    kind: row.kind,
                    template,
                    effect: row.effect.unwrap_or(remove_sentence),
                },
            );
            assert!(previous.is_none(), "duplicate thought: {}", row.text);
            if row.kind == ThoughtKind::Bother {
                bothers.push(row.text);
            }
        }
        Self { thoughts, bothers }
    }

    pub fn classify(&self, sentence: &Sentence) -> Classification {
        if sentence.is_empty() {
            return Classification::Empty;
        }
        match self.thoughts.get(sentence.text().as_str()) {
            Some(thought) => thought.kind.into(),
            None => Classification::Jumble,
        }
    }

    /// Calming and worrying matches run their own effect; everything else is removed.
    pub fn resolve(&self, sentence: &Sentence, effects: &mut Effects) {
        match self.thoughts.get(sentence.text().as_str()) {
            Some(thought) if thought.kind != ThoughtKind::Bother => (thought.effect)(sentence, effects),
            _ => remove_sentence(sentence, effects),
        }
    }

    pub fn template(&self, text: &str) -> Option<&[Word]> {
        self.thoughts
            .get(text)
            .filter(|thought| thought.kind == ThoughtKind::Bother)
            .map(|thought| thought.template.as_slice())
    }

    pub fn bother_texts(&self) -> &[&'static str] {
        &self.bothers
    }
}

/// Shuffled cycle over every bother template.
#[derive(Debug, Default)]
pub struct BotherQueue {
    pending: Vec<&'static str>,
}

impl BotherQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        dictionary: &Dictionary,
        rng: &mut R,
        id: SentenceId,
    ) -> Option<Sentence> {
        if self.pending.is_empty() {
            self.pending.extend_from_slice(dictionary.bother_texts());
            self.pending.shuffle(rng);
        }
        let text = self.pending.pop()?;
        let words = dictionary.template(text)?.to_vec();
        Some(Sentence::new(id, words))
    }
}
