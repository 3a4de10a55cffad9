use crate::error::AppError;

pub const RENDER_HZ: f32 = 30.0;

pub const MAX_THOUGHTS: usize = 6;
pub const MAX_SENTENCE_LENGTH: usize = 7;
pub const INITIAL_THOUGHTS: usize = 3;

pub const MIN_SLEEP_LEVEL: u8 = 0;
pub const MAX_SLEEP_LEVEL: u8 = 4;
pub const STARTING_SLEEP_LEVEL: u8 = 1;

// Ticks are clock minutes: 10 PM to 6 AM.
pub const MAX_TICKS: u32 = 480;
pub const START_HOUR: i32 = -2;

pub const TIME_BETWEEN_THOUGHTS: i32 = 24;
pub const NEW_THOUGHT_COOLDOWN: i32 = 12;

// Indexed by sleep level; deeper sleep ticks faster.
pub const TICK_RATE_MS: [u64; 5] = [900, 600, 400, 250, 150];

pub const SCENE_EXIT_MS: u64 = 400;
pub const BEFORE_PLAYING_MS: u64 = 3000;
pub const STAGGER_MS: u64 = 1200;
pub const DESTROY_SETTLE_MS: u64 = 900;

// Lower bounds on the final rest score, one per tier above Miserable.
pub const OUTCOME_THRESHOLDS: [u64; 5] = [300, 900, 1800, 3000, 4500];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub max_thoughts: usize,
    pub max_sentence_length: usize,
    pub initial_thoughts: usize,
    pub max_ticks: u32,
    pub time_between_thoughts: i32,
    pub new_thought_cooldown: i32,
    pub tick_rate_ms: [u64; 5],
    pub scene_exit_ms: u64,
    pub before_playing_ms: u64,
    pub stagger_ms: u64,
    pub destroy_settle_ms: u64,
    pub outcome_thresholds: [u64; 5],
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_thoughts: MAX_THOUGHTS,
            max_sentence_length: MAX_SENTENCE_LENGTH,
            initial_thoughts: INITIAL_THOUGHTS,
            max_ticks: MAX_TICKS,
            time_between_thoughts: TIME_BETWEEN_THOUGHTS,
            new_thought_cooldown: NEW_THOUGHT_COOLDOWN,
            tick_rate_ms: TICK_RATE_MS,
            scene_exit_ms: SCENE_EXIT_MS,
            before_playing_ms: BEFORE_PLAYING_MS,
            stagger_ms: STAGGER_MS,
            destroy_settle_ms: DESTROY_SETTLE_MS,
            outcome_thresholds: OUTCOME_THRESHOLDS,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Applies `LULLWORDS_SEED` and `LULLWORDS_MAX_TICKS` on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup("LULLWORDS_SEED") {
            config.seed = Some(parse_setting("LULLWORDS_SEED", &raw)?);
        }
        if let Some(raw) = lookup("LULLWORDS_MAX_TICKS") {
            let max_ticks: u32 = parse_setting("LULLWORDS_MAX_TICKS", &raw)?;
            if max_ticks == 0 {
                return Err(AppError::InvalidSetting {
                    name: "LULLWORDS_MAX_TICKS",
                    value: raw,
                });
            }
            config.max_ticks = max_ticks;
        }
        Ok(config)
    }

    pub fn tick_rate_for(&self, sleep_level: u8) -> u64 {
        let idx = (sleep_level as usize).min(self.tick_rate_ms.len() - 1);
        self.tick_rate_ms[idx]
    }
}

fn parse_setting<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| AppError::InvalidSetting {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod from_lookup {
        use super::*;

        #[test]
        fn no_overrides_gives_defaults() {
            let config = GameConfig::from_lookup(|_| None).unwrap();
            assert_eq!(config, GameConfig::default());
        }

        #[test]
        fn reads_seed_and_max_ticks() {
            let config = GameConfig::from_lookup(|name| match name {
                "LULLWORDS_SEED" => Some("42".to_string()),
                "LULLWORDS_MAX_TICKS" => Some(" 60 ".to_string()),
                _ => None,
            })
            .unwrap();
            assert_eq!(config.seed, Some(42));
            assert_eq!(config.max_ticks, 60);
        }

        #[test]
        fn rejects_malformed_seed() {
            let err = GameConfig::from_lookup(|name| {
                (name == "LULLWORDS_SEED").then(|| "soon".to_string())
            })
            .unwrap_err();
            assert!(matches!(
                err,
                AppError::InvalidSetting { name: "LULLWORDS_SEED", .. }
            ));
        }

        #[test]
        fn rejects_zero_max_ticks() {
            let err = GameConfig::from_lookup(|name| {
                (name == "LULLWORDS_MAX_TICKS").then(|| "0".to_string())
            })
            .unwrap_err();
            assert!(matches!(err, AppError::InvalidSetting { .. }));
        }
    }

    mod tick_rate_for {
        use super::*;

        #[test]
        fn deeper_sleep_ticks_faster() {
            let config = GameConfig::default();
            for level in MIN_SLEEP_LEVEL..MAX_SLEEP_LEVEL {
                assert!(config.tick_rate_for(level + 1) < config.tick_rate_for(level));
            }
        }

        #[test]
        fn out_of_range_level_uses_fastest_rate() {
            let config = GameConfig::default();
            assert_eq!(config.tick_rate_for(9), config.tick_rate_for(MAX_SLEEP_LEVEL));
        }
    }
}
