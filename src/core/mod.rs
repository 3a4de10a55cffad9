mod schedule;
mod store;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, trace, warn};

pub use schedule::{Scheduler, Task, TaskHandle};
pub use store::SentenceStore;

use crate::{
    config::{self, GameConfig},
    dictionary::{BotherQueue, Classification, Command, Dictionary, Effects},
    drag::{self, DragController, DropRequest, DropTarget, Element, Surface},
    lexicon::Lexicon,
    types::{Sentence, SentenceId, Vec2},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    Start,
    HowToPlay,
    BeforePlaying,
    Playing,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Outcome {
    Miserable,
    Restless,
    Okay,
    Rested,
    WellRested,
    ImpossiblyGood,
}

impl Outcome {
    const TIERS: [Outcome; 6] = [
        Outcome::Miserable,
        Outcome::Restless,
        Outcome::Okay,
        Outcome::Rested,
        Outcome::WellRested,
        Outcome::ImpossiblyGood,
    ];

    pub fn from_rest(rest: u64, thresholds: &[u64; 5]) -> Self {
        let passed = thresholds.iter().filter(|&&t| rest >= t).count();
        Self::TIERS[passed]
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Miserable => "a miserable night",
            Outcome::Restless => "a restless night",
            Outcome::Okay => "an okay night",
            Outcome::Rested => "a good night",
            Outcome::WellRested => "a great night",
            Outcome::ImpossiblyGood => "an impossibly good night",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordView {
    pub text: String,
    pub draggable: bool,
    pub is_drop_target: bool,
    pub is_dragging: bool,
    pub paired_with_next: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentenceView {
    pub id: SentenceId,
    pub locked: bool,
    pub is_drop_target: bool,
    pub valid_target: bool,
    pub words: Vec<WordView>,
}

/// Read-only state handed to the renderer each frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GameView {
    pub state: GameState,
    pub pending_scene: Option<GameState>,
    pub paused: bool,
    pub sleep_level: u8,
    pub rest: u64,
    pub elapsed_ticks: u32,
    pub max_ticks: u32,
    pub time_to_next_thought: i32,
    pub outcome: Option<Outcome>,
    pub sentences: Vec<SentenceView>,
    pub drag_offset: Option<Vec2>,
}

pub struct Game {
    config: GameConfig,
    dictionary: Dictionary,
    lexicon: Lexicon,
    store: SentenceStore,
    bothers: BotherQueue,
    drag: DragController,
    scheduler: Scheduler,
    rng: StdRng,
    state: GameState,
    pending_scene: Option<GameState>,
    paused: bool,
    sleep_level: u8,
    rest: u64,
    elapsed_ticks: u32,
    time_to_next_thought: i32,
    clock_epoch: u32,
    loads_remaining: usize,
    load_task: Option<TaskHandle>,
    outcome: Option<Outcome>,
    render_requested: bool,
    shut_down: bool,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_parts(config, Dictionary::standard(), Lexicon::standard())
    }

    pub fn with_parts(config: GameConfig, dictionary: Dictionary, lexicon: Lexicon) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            drag: DragController::new(config.max_sentence_length),
            time_to_next_thought: config.time_between_thoughts,
            config,
            dictionary,
            lexicon,
            store: SentenceStore::new(),
            bothers: BotherQueue::new(),
            scheduler: Scheduler::new(),
            rng,
            state: GameState::Start,
            pending_scene: None,
            paused: false,
            sleep_level: config::STARTING_SLEEP_LEVEL,
            rest: 0,
            elapsed_ticks: 0,
            clock_epoch: 0,
            loads_remaining: 0,
            load_task: None,
            outcome: None,
            render_requested: true,
            shut_down: false,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    #[cfg(test)]
    pub fn sentences(&self) -> &[Sentence] {
        self.store.as_slice()
    }

    #[cfg(test)]
    pub fn sleep_level(&self) -> u8 {
        self.sleep_level
    }

    #[cfg(test)]
    pub fn rest(&self) -> u64 {
        self.rest
    }

    #[cfg(test)]
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    pub fn start_game(&mut self) {
        if self.state == GameState::Start && self.is_idle() {
            self.transition(GameState::BeforePlaying);
        }
    }

    pub fn show_how_to_play(&mut self) {
        if self.state == GameState::Start && self.is_idle() {
            self.transition(GameState::HowToPlay);
        }
    }

    pub fn back_to_start(&mut self) {
        if self.state == GameState::HowToPlay && self.is_idle() {
            self.transition(GameState::Start);
        }
    }

    pub fn try_again(&mut self) {
        if self.state == GameState::GameOver && self.is_idle() {
            self.transition(GameState::Start);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.state == GameState::Playing && self.is_idle() {
            self.paused = !self.paused;
            if self.paused {
                self.drag.abort();
            }
            debug!(paused = self.paused, "pause toggled");
            self.request_render();
        }
    }

    pub fn pointer_down(&mut self, point: Vec2, target: Element) {
        if self.state != GameState::Playing || self.paused || !self.is_idle() {
            return;
        }
        if self
            .drag
            .begin(point, target, self.store.as_slice(), &self.lexicon)
        {
            self.request_render();
        }
    }

    pub fn pointer_move<S: Surface + ?Sized>(&mut self, point: Vec2, surface: &S) {
        if !self.drag.is_dragging() {
            return;
        }
        self.drag.update(point, self.store.as_slice(), surface);
        let moved = self
            .drag
            .session()
            .is_some_and(|s| s.geometry.delta() != Vec2::ZERO);
        if moved {
            self.request_render();
        }
    }

    pub fn pointer_up(&mut self) {
        if !self.drag.is_dragging() {
            return;
        }
        if let Some(request) = self.drag.end(self.store.as_slice()) {
            self.resolve_drop(request);
        }
        self.request_render();
    }

    pub fn pointer_cancel(&mut self) {
        if !self.drag.is_dragging() {
            return;
        }
        if let Some(request) = self.drag.cancel(self.store.as_slice()) {
            self.resolve_drop(request);
        }
        self.request_render();
    }

    /// Runs every scheduled task due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        if self.shut_down {
            return;
        }
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            self.run_task(task);
        }
    }

    /// Cancels all pending work; later calls to `advance` do nothing.
    pub fn shutdown(&mut self) {
        debug!(cancelled = self.scheduler.pending(), "shutting down");
        self.scheduler.cancel_all();
        self.drag.abort();
        self.shut_down = true;
    }

    /// Moves one word and resolves every sentence it may have completed.
    /// Returns false when the drop changed nothing.
    pub fn resolve_drop(&mut self, request: DropRequest) -> bool {
        let DropRequest {
            source,
            target_sentence,
            target_index,
        } = request;
        let same_sentence = source.sentence == target_sentence;
        if same_sentence && target_index == Some(source.word) {
            return false;
        }
        let Some(source_len) = self.store.get(source.sentence).map(Sentence::len) else {
            return false;
        };
        if same_sentence && target_index.is_none() && source.word + 1 == source_len {
            return false;
        }
        let target = match target_index {
            Some(slot) => DropTarget::WordSlot(target_sentence, slot),
            None => DropTarget::Container(target_sentence),
        };
        if !drag::is_valid_drop_target(
            target,
            source.sentence,
            self.store.as_slice(),
            self.config.max_sentence_length,
        ) {
            return false;
        }
        if !self.store.move_word(source, target_sentence, target_index) {
            return false;
        }

        let classified: Vec<(SentenceId, Classification)> = self
            .store
            .iter()
            .filter(|s| !s.locked)
            .map(|s| (s.id, self.dictionary.classify(s)))
            .collect();

        let mut completed = false;
        for (id, classification) in classified {
            match classification {
                Classification::Calming => {
                    self.deepen_sleep();
                    completed = true;
                    self.destroy_sentence(id);
                }
                Classification::Worrying => {
                    self.lighten_sleep();
                    completed = true;
                    self.destroy_sentence(id);
                }
                Classification::Empty => self.destroy_sentence(id),
                Classification::Bother | Classification::Jumble => {}
            }
        }
        if completed {
            self.time_to_next_thought = self.config.time_between_thoughts;
        }
        self.request_render();
        true
    }

    pub fn view(&self) -> GameView {
        let session = self.drag.session();
        let source_index = session.and_then(|s| s.source_index(self.store.as_slice()));
        let target = session.map_or(DropTarget::None, |s| s.target);
        let valid = session.is_some_and(|s| s.valid);

        let sentences = self
            .store
            .iter()
            .enumerate()
            .map(|(i, sentence)| {
                let words = sentence
                    .words
                    .iter()
                    .enumerate()
                    .map(|(j, word)| WordView {
                        text: word.text.clone(),
                        draggable: !sentence.locked && self.lexicon.is_draggable(&word.text),
                        is_drop_target: target == DropTarget::WordSlot(i, j),
                        is_dragging: source_index == Some(i)
                            && session.is_some_and(|s| s.source_word == j),
                        paired_with_next: sentence
                            .words
                            .get(j + 1)
                            .is_some_and(|next| self.lexicon.is_paired_with(&word.text, &next.text)),
                    })
                    .collect();
                SentenceView {
                    id: sentence.id,
                    locked: sentence.locked,
                    is_drop_target: target.container() == Some(i),
                    valid_target: target.container() == Some(i) && valid,
                    words,
                }
            })
            .collect();

        GameView {
            state: self.state,
            pending_scene: self.pending_scene,
            paused: self.paused,
            sleep_level: self.sleep_level,
            rest: self.rest,
            elapsed_ticks: self.elapsed_ticks,
            max_ticks: self.config.max_ticks,
            time_to_next_thought: self.time_to_next_thought,
            outcome: self.outcome,
            sentences,
            drag_offset: session.map(|s| s.geometry.offset()),
        }
    }

    fn is_idle(&self) -> bool {
        self.pending_scene.is_none() && !self.shut_down
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    fn transition(&mut self, to: GameState) {
        assert!(
            to != self.state,
            "invalid transition: already in {to:?}"
        );
        assert!(
            self.pending_scene.is_none(),
            "invalid transition: {:?} already pending",
            self.pending_scene
        );
        info!(from = ?self.state, to = ?to, "leaving scene");
        if self.state == GameState::Playing {
            self.stop_clock();
            self.drag.abort();
        }
        self.pending_scene = Some(to);
        self.scheduler
            .schedule(self.config.scene_exit_ms, Task::EnterScene(to));
        self.request_render();
    }

    fn enter_scene(&mut self, to: GameState) {
        assert!(
            to != self.state,
            "invalid transition: already in {to:?}"
        );
        self.pending_scene = None;
        self.state = to;
        info!(state = ?to, "entered scene");
        match to {
            GameState::Start | GameState::HowToPlay => {
                self.store.clear();
                self.paused = false;
            }
            GameState::BeforePlaying => {
                self.store.clear();
                self.paused = false;
                self.rest = 0;
                self.sleep_level = config::STARTING_SLEEP_LEVEL;
                self.elapsed_ticks = 0;
                self.outcome = None;
                self.scheduler
                    .schedule(self.config.before_playing_ms, Task::BeginPlaying);
            }
            GameState::Playing => {
                self.time_to_next_thought = self.config.time_between_thoughts;
                self.start_clock();
                self.loads_remaining = self.config.initial_thoughts;
                if self.loads_remaining > 0 {
                    self.load_task = Some(self.scheduler.schedule(0, Task::LoadBother));
                }
            }
            GameState::GameOver => {
                self.stop_clock();
                self.loads_remaining = 0;
                if let Some(handle) = self.load_task.take() {
                    self.scheduler.cancel(handle);
                }
                let outcome = Outcome::from_rest(self.rest, &self.config.outcome_thresholds);
                info!(rest = self.rest, outcome = ?outcome, "game over");
                self.outcome = Some(outcome);
            }
        }
        self.request_render();
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::EnterScene(to) => self.enter_scene(to),
            Task::BeginPlaying => {
                if self.state == GameState::BeforePlaying && self.pending_scene.is_none() {
                    self.transition(GameState::Playing);
                }
            }
            Task::LoadBother => self.load_next_bother(),
            Task::Settle(id) => self.settle(id),
            Task::Tick { epoch } => self.on_clock(epoch),
        }
    }

    fn start_clock(&mut self) {
        self.clock_epoch = self.clock_epoch.wrapping_add(1);
        let epoch = self.clock_epoch;
        self.scheduler.schedule(
            self.config.tick_rate_for(self.sleep_level),
            Task::Tick { epoch },
        );
    }

    fn stop_clock(&mut self) {
        self.clock_epoch = self.clock_epoch.wrapping_add(1);
    }

    fn clock_running(&self, epoch: u32) -> bool {
        epoch == self.clock_epoch && self.state == GameState::Playing && self.pending_scene.is_none()
    }

    fn on_clock(&mut self, epoch: u32) {
        if !self.clock_running(epoch) {
            trace!(epoch, "stale tick dropped");
            return;
        }
        if !self.paused {
            self.tick();
        }
        if self.clock_running(epoch) {
            self.scheduler.schedule(
                self.config.tick_rate_for(self.sleep_level),
                Task::Tick { epoch },
            );
        }
    }

    fn tick(&mut self) {
        if self.elapsed_ticks >= self.config.max_ticks {
            self.transition(GameState::GameOver);
            return;
        }
        self.elapsed_ticks += 1;
        self.rest += (1u64 << self.sleep_level) - 1;
        self.time_to_next_thought -= 1;
        trace!(
            now = self.scheduler.now(),
            elapsed = self.elapsed_ticks,
            rest = self.rest,
            next_thought = self.time_to_next_thought,
            "tick"
        );
        if self.time_to_next_thought <= 0 {
            if self.sleep_level == config::MIN_SLEEP_LEVEL {
                self.sleep_level = config::STARTING_SLEEP_LEVEL;
            } else {
                self.sleep_level -= 1;
            }
            self.spawn_bother();
            self.time_to_next_thought =
                self.config.time_between_thoughts + self.config.new_thought_cooldown;
        }
        self.request_render();
    }

    fn load_next_bother(&mut self) {
        if self.state != GameState::Playing || self.pending_scene.is_some() || self.loads_remaining == 0 {
            return;
        }
        self.loads_remaining -= 1;
        self.load_task = None;
        self.spawn_bother();
        if self.loads_remaining > 0 {
            let handle = self.scheduler.schedule(self.config.stagger_ms, Task::LoadBother);
            self.load_task = Some(handle);
        }
    }

    fn spawn_bother(&mut self) {
        let id = self.store.mint_id();
        match self.bothers.draw(&self.dictionary, &mut self.rng, id) {
            Some(sentence) => self.push_sentence(sentence),
            None => warn!("dictionary has no bother thoughts"),
        }
    }

    fn spawn_template(&mut self, template: &str) {
        let Some(words) = self.dictionary.template(template).map(|words| words.to_vec()) else {
            warn!(template, "effect named an unknown bother");
            return;
        };
        let id = self.store.mint_id();
        self.push_sentence(Sentence::new(id, words));
    }

    /// A full board makes room by dropping its oldest unresolved thought as
    /// a worry. Thoughts already on their way out have been scored, so if
    /// nothing else is left the oldest one goes without a penalty.
    fn push_sentence(&mut self, sentence: Sentence) {
        if self.store.len() >= self.config.max_thoughts {
            let unresolved = self.store.iter().position(|s| !s.locked);
            if let Some(evicted) = self.store.remove(unresolved.unwrap_or(0)) {
                if unresolved.is_some() {
                    self.lighten_sleep();
                }
                debug!(id = evicted.id, text = %evicted.text(), "thought evicted");
            }
        }
        debug!(id = sentence.id, text = %sentence.text(), "thought spawned");
        self.store.push(sentence);
        self.request_render();
    }

    fn destroy_sentence(&mut self, id: SentenceId) {
        if let Some(sentence) = self.store.find_mut(id) {
            sentence.locked = true;
        }
        self.scheduler
            .schedule(self.config.destroy_settle_ms, Task::Settle(id));
    }

    fn settle(&mut self, id: SentenceId) {
        let Some(sentence) = self.store.position(id).and_then(|i| self.store.get(i)).cloned() else {
            debug!(id, "stale settle skipped");
            return;
        };
        let mut effects = Effects::new();
        self.dictionary.resolve(&sentence, &mut effects);
        debug!(id, text = %sentence.text(), "thought resolved");
        for command in effects.into_commands() {
            self.apply_command(command);
        }
        self.request_render();
    }

    fn apply_command(&mut self, command: Command) {
        let spawning_allowed = self.state == GameState::Playing && self.pending_scene.is_none();
        match command {
            Command::Remove(id) => {
                self.store.remove_id(id);
            }
            Command::Replace { id, template } => {
                let Some(words) = self.dictionary.template(template).map(|words| words.to_vec()) else {
                    warn!(template, "effect named an unknown bother");
                    self.store.remove_id(id);
                    return;
                };
                let new_id = self.store.mint_id();
                if let Some(sentence) = self.store.find_mut(id) {
                    *sentence = Sentence::new(new_id, words);
                }
            }
            Command::Spawn(template) if spawning_allowed => self.spawn_template(template),
            Command::SpawnRandom if spawning_allowed => self.spawn_bother(),
            Command::Spawn(_) | Command::SpawnRandom => {}
        }
    }

    fn deepen_sleep(&mut self) {
        self.sleep_level = (self.sleep_level + 1).min(config::MAX_SLEEP_LEVEL);
    }

    fn lighten_sleep(&mut self) {
        self.sleep_level = self.sleep_level.saturating_sub(1).max(config::MIN_SLEEP_LEVEL);
    }
}
