use std::collections::{HashMap, HashSet};

const PAIRS: &[(&str, &str)] = &[
    ("no", "thing"),
    ("no", "one"),
    ("some", "thing"),
    ("some", "what"),
    ("some", "one"),
    ("comfort", "able"),
    ("can", "not"),
    ("any", "thing"),
];

const DRAGGABLES: &[&str] = &[
    "did", "was", "were", "not", "no", "there", "very", "so", "will", "who", "what", "when",
    "where", "why", "how", "rest", "sleep", "that", "am",
];

/// Which words can be picked up, and which adjacent words read as one.
#[derive(Debug)]
pub struct Lexicon {
    pairs: HashMap<&'static str, HashSet<&'static str>>,
    draggables: HashSet<&'static str>,
}

impl Lexicon {
    pub fn standard() -> Self {
        Self::from_tables(PAIRS, DRAGGABLES)
    }

    /// Both halves of every pair are draggable as well.
    pub fn from_tables(pairs: &[(&'static str, &'static str)], draggables: &[&'static str]) -> Self {
        let mut lexicon = Self {
            pairs: HashMap::new(),
            draggables: draggables.iter().copied().collect(),
        };
        for &(pre, post) in pairs {
            lexicon.pairs.entry(pre).or_default().insert(post);
            lexicon.draggables.insert(pre);
            lexicon.draggables.insert(post);
        }
        lexicon
    }

    pub fn is_draggable(&self, word: &str) -> bool {
        self.draggables.contains(word)
    }

    pub fn is_paired_with(&self, pre: &str, post: &str) -> bool {
        self.pairs.get(pre).is_some_and(|posts| posts.contains(post))
    }
}
