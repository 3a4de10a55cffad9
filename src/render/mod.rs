use crate::{
    config,
    core::{GameView, SentenceView},
    drag::{Element, Surface},
    spatial::SpatialHash,
    types::{Rect, Vec2},
};

const BOARD_MARGIN: f32 = 1.0;
const ROW_GAP: f32 = 1.0;
const WORD_GAP: f32 = 1.0;
const HASH_CELL: f32 = 8.0;

const LAYER_BOX: u8 = 1;
const LAYER_WORD: u8 = 2;
const LAYER_DRAG: u8 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorId {
    White,
    Gray,
    Blue,
    Cyan,
    Green,
    Yellow,
    Magenta,
    Red,
}

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// Board geometry for one frame: sentence rows stacked top to bottom, word
/// boxes flowing left to right and wrapping inside each row. Rows that do not
/// fit the viewport are left out, so they are neither drawn nor hit.
#[derive(Debug)]
pub struct SceneLayout {
    viewport: Viewport,
    sentences: Vec<Rect>,
    words: Vec<Vec<Rect>>,
    flat: Vec<(usize, usize)>,
    hash: SpatialHash,
}

impl SceneLayout {
    pub fn new(view: &GameView, viewport: Viewport) -> Self {
        let inner_right = (viewport.width as f32 - BOARD_MARGIN).max(BOARD_MARGIN + 1.0);
        let mut sentences = Vec::with_capacity(view.sentences.len());
        let mut words = Vec::with_capacity(view.sentences.len());
        let mut y = 0.0;

        for sentence in &view.sentences {
            let mut boxes = Vec::with_capacity(sentence.words.len());
            let mut x = BOARD_MARGIN + 1.0;
            let mut line = 0.0;
            for (j, word) in sentence.words.iter().enumerate() {
                let width = word.text.chars().count() as f32 + 2.0;
                if x + width > inner_right && j > 0 {
                    x = BOARD_MARGIN + 1.0;
                    line += 1.0;
                }
                boxes.push(Rect::new(x, y + 1.0 + line, width, 1.0));
                x += width;
                if !word.paired_with_next {
                    x += WORD_GAP;
                }
            }
            let height = line + 3.0;
            if y + height > viewport.height as f32 {
                break;
            }
            sentences.push(Rect::new(0.0, y, viewport.width as f32, height));
            words.push(boxes);
            y += height + ROW_GAP;
        }

        let mut flat = Vec::new();
        let mut rects = Vec::new();
        for (i, boxes) in words.iter().enumerate() {
            for (j, rect) in boxes.iter().enumerate() {
                flat.push((i, j));
                rects.push(*rect);
            }
        }
        let mut hash = SpatialHash::new(HASH_CELL);
        hash.rebuild(&rects);

        Self {
            viewport,
            sentences,
            words,
            flat,
            hash,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences.len()
    }

    fn word_rect(&self, sentence: usize, word: usize) -> Option<Rect> {
        self.words.get(sentence)?.get(word).copied()
    }
}

impl Surface for SceneLayout {
    fn element_at(&self, scope: Element, point: Vec2, ignore: Option<Element>) -> Option<Element> {
        match scope {
            Element::Board => self
                .sentences
                .iter()
                .position(|rect| rect.contains(point))
                .map(Element::Sentence)
                .filter(|element| Some(*element) != ignore),
            Element::Sentence(sentence) => {
                let mut candidates = Vec::new();
                self.hash.query_point(point, &mut candidates);
                candidates.sort_unstable();
                candidates
                    .into_iter()
                    .filter_map(|idx| self.flat.get(idx).copied())
                    .filter(|&(s, _)| s == sentence)
                    .map(|(s, w)| Element::Word { sentence: s, word: w })
                    .filter(|element| Some(*element) != ignore)
                    .find(|element| match *element {
                        Element::Word { sentence, word } => self
                            .word_rect(sentence, word)
                            .is_some_and(|rect| rect.contains(point)),
                        _ => false,
                    })
            }
            Element::Word { .. } => None,
        }
    }

    fn has_boundary(&self, element: Element) -> bool {
        !matches!(element, Element::Word { .. })
    }

    fn sentence_rect(&self, sentence: usize) -> Option<Rect> {
        self.sentences.get(sentence).copied()
    }

    fn word_rects(&self, sentence: usize) -> &[Rect] {
        self.words.get(sentence).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    pub layer: u8,
    pub color: ColorId,
}

const BLANK: RenderCell = RenderCell {
    ch: ' ',
    layer: 0,
    color: ColorId::White,
};

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(len, BLANK);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(BLANK);
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn set(&mut self, x: i32, y: i32, ch: char, layer: u8, color: ColorId) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if layer >= cell.layer {
            *cell = RenderCell { ch, layer, color };
        }
    }

    fn put_str(&mut self, x: i32, y: i32, text: &str, layer: u8, color: ColorId) {
        for (i, ch) in text.chars().enumerate() {
            self.set(x + i as i32, y, ch, layer, color);
        }
    }
}

pub fn draw(view: &GameView, layout: &SceneLayout, frame: &mut FrameBuffer) {
    let viewport = layout.viewport();
    if frame.width() != viewport.width || frame.height() != viewport.height {
        frame.resize(viewport.width, viewport.height);
    } else {
        frame.clear();
    }

    let offset = view.drag_offset.unwrap_or(Vec2::ZERO);
    for (i, sentence) in view.sentences.iter().enumerate().take(layout.sentence_count()) {
        if let Some(rect) = layout.sentence_rect(i) {
            draw_box(frame, rect, box_color(sentence, view.sleep_level));
        }
        for (j, word) in sentence.words.iter().enumerate() {
            let Some(rect) = layout.word_rect(i, j) else {
                continue;
            };
            let x = rect.x.round() as i32 + 1;
            let y = rect.y.round() as i32;
            if word.is_dragging {
                let dx = offset.x.round() as i32;
                let dy = offset.y.round() as i32;
                frame.put_str(x - 1 + dx, y + dy, "[", LAYER_DRAG, ColorId::Magenta);
                frame.put_str(x + dx, y + dy, &word.text, LAYER_DRAG, ColorId::Magenta);
                let end = x + word.text.chars().count() as i32;
                frame.put_str(end + dx, y + dy, "]", LAYER_DRAG, ColorId::Magenta);
                frame.put_str(x, y, &word.text, LAYER_WORD, ColorId::Gray);
                continue;
            }
            let color = if sentence.locked {
                ColorId::Gray
            } else if word.is_drop_target {
                ColorId::Cyan
            } else if word.draggable {
                ColorId::Yellow
            } else {
                ColorId::White
            };
            frame.put_str(x, y, &word.text, LAYER_WORD, color);
        }
    }
}

fn draw_box(frame: &mut FrameBuffer, rect: Rect, color: ColorId) {
    let left = rect.x.round() as i32;
    let top = rect.y.round() as i32;
    let right = (rect.right().round() as i32) - 1;
    let bottom = (rect.bottom().round() as i32) - 1;
    if right <= left || bottom <= top {
        return;
    }
    for x in left + 1..right {
        frame.set(x, top, '─', LAYER_BOX, color);
        frame.set(x, bottom, '─', LAYER_BOX, color);
    }
    for y in top + 1..bottom {
        frame.set(left, y, '│', LAYER_BOX, color);
        frame.set(right, y, '│', LAYER_BOX, color);
    }
    frame.set(left, top, '╭', LAYER_BOX, color);
    frame.set(right, top, '╮', LAYER_BOX, color);
    frame.set(left, bottom, '╰', LAYER_BOX, color);
    frame.set(right, bottom, '╯', LAYER_BOX, color);
}

fn box_color(sentence: &SentenceView, sleep_level: u8) -> ColorId {
    if sentence.locked {
        ColorId::Gray
    } else if sentence.is_drop_target && sentence.valid_target {
        ColorId::Green
    } else if sentence.is_drop_target {
        ColorId::Red
    } else {
        sleep_color(sleep_level)
    }
}

pub fn sleep_color(sleep_level: u8) -> ColorId {
    match sleep_level {
        0 => ColorId::Red,
        1 => ColorId::Yellow,
        2 => ColorId::Cyan,
        3 => ColorId::Blue,
        _ => ColorId::Magenta,
    }
}

/// Bedside clock for an elapsed tick count, one tick per minute.
pub fn clock_label(elapsed_ticks: u32) -> String {
    let minutes = (config::START_HOUR * 60 + elapsed_ticks as i32).rem_euclid(24 * 60);
    let (hour, minute) = (minutes / 60, minutes % 60);
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour:02}:{minute:02} {suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::WordView, drag::element_from_point, types::SentenceId};

    fn word(text: &str) -> WordView {
        WordView {
            text: text.to_string(),
            draggable: true,
            is_drop_target: false,
            is_dragging: false,
            paired_with_next: false,
        }
    }

    fn sentence(id: SentenceId, text: &str) -> SentenceView {
        SentenceView {
            id,
            locked: false,
            is_drop_target: false,
            valid_target: false,
            words: text.split_whitespace().map(word).collect(),
        }
    }

    fn view_with(sentences: Vec<SentenceView>) -> GameView {
        GameView {
            state: crate::core::GameState::Playing,
            pending_scene: None,
            paused: false,
            sleep_level: 1,
            rest: 0,
            elapsed_ticks: 0,
            max_ticks: config::MAX_TICKS,
            time_to_next_thought: config::TIME_BETWEEN_THOUGHTS,
            outcome: None,
            sentences,
            drag_offset: None,
        }
    }

    const VIEWPORT: Viewport = Viewport {
        width: 60,
        height: 20,
    };

    mod scene_layout {
        use super::*;

        #[test]
        fn rows_stack_with_gap() {
            let view = view_with(vec![sentence(1, "will i sleep"), sentence(2, "can i rest")]);
            let layout = SceneLayout::new(&view, VIEWPORT);
            assert_eq!(layout.sentence_count(), 2);
            assert_eq!(layout.sentence_rect(0), Some(Rect::new(0.0, 0.0, 60.0, 3.0)));
            assert_eq!(layout.sentence_rect(1), Some(Rect::new(0.0, 4.0, 60.0, 3.0)));
        }

        #[test]
        fn word_boxes_pad_text_and_keep_gaps() {
            let view = view_with(vec![sentence(1, "will i sleep")]);
            let layout = SceneLayout::new(&view, VIEWPORT);
            let rects = layout.word_rects(0);
            assert_eq!(rects[0], Rect::new(2.0, 1.0, 6.0, 1.0));
            assert_eq!(rects[1], Rect::new(9.0, 1.0, 3.0, 1.0));
            assert_eq!(rects[2], Rect::new(13.0, 1.0, 7.0, 1.0));
        }

        #[test]
        fn paired_words_touch() {
            let mut s = sentence(1, "no thing");
            s.words[0].paired_with_next = true;
            let layout = SceneLayout::new(&view_with(vec![s]), VIEWPORT);
            let rects = layout.word_rects(0);
            assert_eq!(rects[0].right(), rects[1].x);
        }

        #[test]
        fn long_sentences_wrap_and_grow() {
            let narrow = Viewport {
                width: 16,
                height: 20,
            };
            let view = view_with(vec![sentence(1, "did i lock the door"), sentence(2, "no")]);
            let layout = SceneLayout::new(&view, narrow);
            let rects = layout.word_rects(0);
            assert!(rects.iter().any(|r| r.y > 1.0));
            let first = layout.sentence_rect(0).unwrap();
            assert!(first.height > 3.0);
            assert_eq!(layout.sentence_rect(1).unwrap().y, first.bottom() + ROW_GAP);
        }

        #[test]
        fn rows_below_the_board_are_clipped() {
            let short = Viewport {
                width: 60,
                height: 5,
            };
            let view = view_with(vec![sentence(1, "will i sleep"), sentence(2, "can i rest")]);
            let layout = SceneLayout::new(&view, short);
            assert_eq!(layout.sentence_count(), 1);
            assert!(layout.sentence_rect(1).is_none());
            assert!(layout.word_rects(1).is_empty());
            assert_eq!(
                element_from_point(&layout, Vec2::new(10.0, 5.0), None),
                Element::Board
            );
        }

        #[test]
        fn missing_sentence_has_no_geometry() {
            let layout = SceneLayout::new(&view_with(Vec::new()), VIEWPORT);
            assert!(layout.sentence_rect(0).is_none());
            assert!(layout.word_rects(3).is_empty());
        }
    }

    mod surface_hit_test {
        use super::*;

        #[test]
        fn pierces_board_then_sentence_then_word() {
            let view = view_with(vec![sentence(1, "will i sleep"), sentence(2, "can i rest")]);
            let layout = SceneLayout::new(&view, VIEWPORT);
            assert_eq!(
                element_from_point(&layout, Vec2::new(10.0, 5.0), None),
                Element::Word {
                    sentence: 1,
                    word: 1
                }
            );
            assert_eq!(
                element_from_point(&layout, Vec2::new(40.0, 5.0), None),
                Element::Sentence(1)
            );
            assert_eq!(
                element_from_point(&layout, Vec2::new(10.0, 3.0), None),
                Element::Board
            );
        }

        #[test]
        fn ignored_word_is_transparent() {
            let view = view_with(vec![sentence(1, "will i sleep")]);
            let layout = SceneLayout::new(&view, VIEWPORT);
            let ignored = Element::Word {
                sentence: 0,
                word: 0,
            };
            assert_eq!(
                element_from_point(&layout, Vec2::new(3.0, 1.0), Some(ignored)),
                Element::Sentence(0)
            );
        }
    }

    mod framebuffer {
        use super::*;

        #[test]
        fn creates_with_correct_dimensions() {
            let fb = FrameBuffer::new(80, 24);
            assert_eq!(fb.width(), 80);
            assert_eq!(fb.height(), 24);
        }

        #[test]
        fn resize_clears_cells() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(1, 1, 'A', LAYER_WORD, ColorId::Blue);
            fb.resize(20, 15);
            assert_eq!(fb.width(), 20);
            assert_eq!(fb.get(1, 1).ch, ' ');
        }

        #[test]
        fn lower_layer_does_not_overwrite() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(5, 5, 'A', LAYER_DRAG, ColorId::Blue);
            fb.set(5, 5, 'B', LAYER_BOX, ColorId::Red);
            let cell = fb.get(5, 5);
            assert_eq!(cell.ch, 'A');
            assert_eq!(cell.color, ColorId::Blue);
        }

        #[test]
        fn out_of_bounds_is_ignored() {
            let mut fb = FrameBuffer::new(10, 10);
            fb.set(100, 100, 'X', LAYER_WORD, ColorId::Blue);
            fb.set(-1, 3, 'X', LAYER_WORD, ColorId::Blue);
            assert_eq!(fb.get(0, 3).ch, ' ');
        }
    }

    mod draw_fn {
        use super::*;

        fn render(view: &GameView) -> FrameBuffer {
            let layout = SceneLayout::new(view, VIEWPORT);
            let mut frame = FrameBuffer::new(0, 0);
            draw(view, &layout, &mut frame);
            frame
        }

        #[test]
        fn empty_board_is_blank() {
            let frame = render(&view_with(Vec::new()));
            for y in 0..VIEWPORT.height {
                for x in 0..VIEWPORT.width {
                    assert_eq!(frame.get(x, y).ch, ' ');
                }
            }
        }

        #[test]
        fn words_sit_inside_their_boxes() {
            let frame = render(&view_with(vec![sentence(1, "will i sleep")]));
            assert_eq!(frame.get(0, 0).ch, '╭');
            assert_eq!(frame.get(3, 1).ch, 'w');
            assert_eq!(frame.get(10, 1).ch, 'i');
            assert_eq!(frame.get(3, 1).color, ColorId::Yellow);
        }

        #[test]
        fn locked_sentence_is_gray() {
            let mut s = sentence(1, "i can rest");
            s.locked = true;
            let frame = render(&view_with(vec![s]));
            assert_eq!(frame.get(0, 0).color, ColorId::Gray);
            assert_eq!(frame.get(3, 1).color, ColorId::Gray);
        }

        #[test]
        fn drop_target_box_shows_validity() {
            let mut s = sentence(1, "can i rest");
            s.is_drop_target = true;
            s.valid_target = true;
            let frame = render(&view_with(vec![s.clone()]));
            assert_eq!(frame.get(0, 0).color, ColorId::Green);
            s.valid_target = false;
            let frame = render(&view_with(vec![s]));
            assert_eq!(frame.get(0, 0).color, ColorId::Red);
        }

        #[test]
        fn clipped_rows_are_not_drawn() {
            let view = view_with(vec![sentence(1, "will i sleep"), sentence(2, "can i rest")]);
            let short = Viewport {
                width: 60,
                height: 6,
            };
            let layout = SceneLayout::new(&view, short);
            let mut frame = FrameBuffer::new(0, 0);
            draw(&view, &layout, &mut frame);
            assert_eq!(frame.get(0, 4).ch, ' ');
            assert_eq!(frame.get(3, 5).ch, ' ');
        }

        #[test]
        fn dragged_word_follows_offset_on_top() {
            let mut s = sentence(1, "will i sleep");
            s.words[0].is_dragging = true;
            let mut view = view_with(vec![s, sentence(2, "can i rest")]);
            view.drag_offset = Some(Vec2::new(2.0, 4.0));
            let frame = render(&view);
            assert_eq!(frame.get(5, 5).ch, 'w');
            assert_eq!(frame.get(5, 5).color, ColorId::Magenta);
            assert_eq!(frame.get(3, 1).color, ColorId::Gray);
        }
    }

    mod clock_label_fn {
        use super::*;

        #[test]
        fn starts_at_ten_pm() {
            assert_eq!(clock_label(0), "10:00 PM");
        }

        #[test]
        fn crosses_midnight() {
            assert_eq!(clock_label(119), "11:59 PM");
            assert_eq!(clock_label(120), "12:00 AM");
            assert_eq!(clock_label(185), "01:05 AM");
        }

        #[test]
        fn last_tick_is_six_am() {
            assert_eq!(clock_label(config::MAX_TICKS), "06:00 AM");
        }
    }

    mod sleep_color_fn {
        use super::*;

        #[test]
        fn every_level_has_a_color() {
            for level in config::MIN_SLEEP_LEVEL..=config::MAX_SLEEP_LEVEL {
                let _ = sleep_color(level);
            }
            assert_ne!(sleep_color(0), sleep_color(config::MAX_SLEEP_LEVEL));
        }
    }
}
