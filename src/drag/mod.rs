//! Pointer-driven drag sessions.
//!
//! A session starts on a draggable word and ends on pointer-up or cancel.
//! While it is live, every move re-resolves the element under the pointer
//! through a [`Surface`] and turns it into a [`DropTarget`]. The controller
//! never touches the sentence store; it only reads it to validate targets
//! and hands a [`DropRequest`] back to the game.

use std::collections::HashMap;

use crate::{
    lexicon::Lexicon,
    types::{Rect, Sentence, SentenceId, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    Board,
    Sentence(usize),
    Word { sentence: usize, word: usize },
}

/// Rendered geometry the drag controller hit-tests against.
pub trait Surface {
    /// Topmost element at `point` directly inside `scope`, skipping `ignore`.
    fn element_at(&self, scope: Element, point: Vec2, ignore: Option<Element>) -> Option<Element>;

    /// Whether `element` encloses its own children.
    fn has_boundary(&self, element: Element) -> bool;

    fn sentence_rect(&self, sentence: usize) -> Option<Rect>;

    fn word_rects(&self, sentence: usize) -> &[Rect];
}

/// Descends through nested boundaries until no deeper element is found.
pub fn element_from_point<S: Surface + ?Sized>(
    surface: &S,
    point: Vec2,
    ignore: Option<Element>,
) -> Element {
    let mut target = Element::Board;
    while surface.has_boundary(target) {
        match surface.element_at(target, point, ignore) {
            Some(next) if next != target => target = next,
            _ => break,
        }
    }
    target
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DropTarget {
    #[default]
    None,
    /// Append to the end of the sentence.
    Container(usize),
    WordSlot(usize, usize),
}

impl DropTarget {
    pub fn container(&self) -> Option<usize> {
        match *self {
            DropTarget::None => None,
            DropTarget::Container(c) | DropTarget::WordSlot(c, _) => Some(c),
        }
    }

    pub fn slot(&self) -> Option<usize> {
        match *self {
            DropTarget::WordSlot(_, w) => Some(w),
            _ => None,
        }
    }
}

/// Pointer positions of one gesture, rebuilt on every move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragGeometry {
    pub anchor: Vec2,
    pub current: Vec2,
    pub previous: Vec2,
}

impl DragGeometry {
    pub fn start(anchor: Vec2) -> Self {
        Self {
            anchor,
            current: anchor,
            previous: anchor,
        }
    }

    pub fn moved_to(self, point: Vec2) -> Self {
        Self {
            anchor: self.anchor,
            current: point,
            previous: self.current,
        }
    }

    /// Where the dragged word is drawn relative to its resting place.
    pub fn offset(&self) -> Vec2 {
        self.current - self.anchor
    }

    pub fn delta(&self) -> Vec2 {
        self.current - self.previous
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordRef {
    pub sentence: usize,
    pub word: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    pub source_id: SentenceId,
    pub source_word: usize,
    pub geometry: DragGeometry,
    pub target: DropTarget,
    target_id: Option<SentenceId>,
    pub valid: bool,
}

impl DragSession {
    pub fn source_index(&self, sentences: &[Sentence]) -> Option<usize> {
        sentences.iter().position(|s| s.id == self.source_id)
    }
}

/// A drop the game should apply. `target_index == None` appends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DropRequest {
    pub source: WordRef,
    pub target_sentence: usize,
    pub target_index: Option<usize>,
}

/// Word midpoints per sentence, keyed by the text they were measured for.
#[derive(Debug, Default)]
struct BreakpointCache {
    entries: HashMap<SentenceId, (String, Vec<f32>)>,
}

impl BreakpointCache {
    fn slot_index<S: Surface + ?Sized>(
        &mut self,
        sentence: &Sentence,
        index: usize,
        surface: &S,
        pointer_x: f32,
    ) -> usize {
        let Some(rect) = surface.sentence_rect(index) else {
            return sentence.len();
        };
        let signature = sentence.text();
        let entry = self
            .entries
            .entry(sentence.id)
            .or_insert_with(|| (String::new(), Vec::new()));
        if entry.0 != signature || entry.1.len() != sentence.len() {
            entry.1 = surface
                .word_rects(index)
                .iter()
                .map(|word| word.mid_x() - rect.x)
                .collect();
            entry.0 = signature;
        }
        let relative_x = pointer_x - rect.x;
        entry
            .1
            .iter()
            .position(|&breakpoint| breakpoint > relative_x)
            .unwrap_or(sentence.len())
    }

    fn retain(&mut self, sentences: &[Sentence]) {
        self.entries
            .retain(|id, _| sentences.iter().any(|s| s.id == *id));
    }
}

#[derive(Debug)]
pub struct DragController {
    max_sentence_length: usize,
    session: Option<DragSession>,
    breakpoints: BreakpointCache,
}

impl DragController {
    pub fn new(max_sentence_length: usize) -> Self {
        Self {
            max_sentence_length,
            session: None,
            breakpoints: BreakpointCache::default(),
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a session on a draggable word of an unlocked sentence.
    pub fn begin(
        &mut self,
        point: Vec2,
        target: Element,
        sentences: &[Sentence],
        lexicon: &Lexicon,
    ) -> bool {
        let Element::Word { sentence, word } = target else {
            return false;
        };
        let Some(source) = sentences.get(sentence) else {
            return false;
        };
        if source.locked {
            return false;
        }
        let Some(text) = source.words.get(word) else {
            return false;
        };
        if !lexicon.is_draggable(&text.text) {
            return false;
        }
        self.session = Some(DragSession {
            source_id: source.id,
            source_word: word,
            geometry: DragGeometry::start(point),
            target: DropTarget::None,
            target_id: None,
            valid: false,
        });
        true
    }

    pub fn update<S: Surface + ?Sized>(&mut self, point: Vec2, sentences: &[Sentence], surface: &S) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.geometry = session.geometry.moved_to(point);
        let source = session
            .source_index(sentences)
            .map(|index| (index, session.source_word));

        let target = match source {
            Some((sentence, word)) => {
                let ignore = Element::Word { sentence, word };
                self.target_at(point, ignore, sentences, surface)
            }
            None => DropTarget::None,
        };
        let valid = source.is_some_and(|(index, _)| {
            is_valid_drop_target(target, index, sentences, self.max_sentence_length)
        });
        let target_id = target
            .container()
            .and_then(|c| sentences.get(c))
            .map(|s| s.id);

        if let Some(session) = self.session.as_mut() {
            session.target = target;
            session.target_id = target_id;
            session.valid = valid;
        }
        self.breakpoints.retain(sentences);
    }

    fn target_at<S: Surface + ?Sized>(
        &mut self,
        point: Vec2,
        ignore: Element,
        sentences: &[Sentence],
        surface: &S,
    ) -> DropTarget {
        match element_from_point(surface, point, Some(ignore)) {
            Element::Word { sentence, word } => DropTarget::WordSlot(sentence, word),
            Element::Sentence(index) => match sentences.get(index) {
                Some(sentence) => {
                    let slot = self.slot_index_from_pointer(sentence, index, surface, point.x);
                    if slot >= sentence.len() {
                        DropTarget::Container(index)
                    } else {
                        DropTarget::WordSlot(index, slot)
                    }
                }
                None => DropTarget::None,
            },
            Element::Board => DropTarget::None,
        }
    }

    /// Closes the session. `None` means the drop changes nothing.
    pub fn end(&mut self, sentences: &[Sentence]) -> Option<DropRequest> {
        let session = self.session.take()?;
        if !session.valid {
            return None;
        }
        let source_sentence = session.source_index(sentences)?;
        let target_id = session.target_id?;
        let target_sentence = sentences.iter().position(|s| s.id == target_id)?;
        let target_index = session.target.slot();
        let target = match target_index {
            Some(slot) => DropTarget::WordSlot(target_sentence, slot),
            None => DropTarget::Container(target_sentence),
        };
        if !is_valid_drop_target(target, source_sentence, sentences, self.max_sentence_length) {
            return None;
        }
        Some(DropRequest {
            source: WordRef {
                sentence: source_sentence,
                word: session.source_word,
            },
            target_sentence,
            target_index,
        })
    }

    /// Same as [`DragController::end`] with whatever target was last seen.
    pub fn cancel(&mut self, sentences: &[Sentence]) -> Option<DropRequest> {
        self.end(sentences)
    }

    /// Drops the session without producing a request.
    pub fn abort(&mut self) {
        self.session = None;
    }

    pub fn slot_index_from_pointer<S: Surface + ?Sized>(
        &mut self,
        sentence: &Sentence,
        index: usize,
        surface: &S,
        pointer_x: f32,
    ) -> usize {
        self.breakpoints.slot_index(sentence, index, surface, pointer_x)
    }
}

/// Full sentences only take words that already belong to them.
pub fn is_valid_drop_target(
    target: DropTarget,
    source_sentence: usize,
    sentences: &[Sentence],
    max_sentence_length: usize,
) -> bool {
    let Some(container) = target.container() else {
        return false;
    };
    let Some(sentence) = sentences.get(container) else {
        return false;
    };
    if sentence.locked {
        return false;
    }
    container == source_sentence || sentence.len() < max_sentence_length
}
