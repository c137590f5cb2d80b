use crate::config;
use crate::player::{LoopMode, PlayerOptions};

/// Initial player flags from the loaded settings.
pub fn player_options(settings: &config::Settings) -> PlayerOptions {
    PlayerOptions {
        shuffle: settings.playback.shuffle,
        loop_mode: LoopMode::from(settings.playback.loop_mode),
        volume: settings.audio.volume,
    }
}
