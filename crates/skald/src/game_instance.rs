//! # Game Instance
//!
//! State that lives for the whole play session rather than one map: which
//! map to start on, which map the player came from, where to continue, and
//! what the player has collected. It is saved on its own, apart from world
//! saves, as a single block of the text format.
//!
//! ```text
//! Use Game Saves
//! true
//! Starting Map
//! church_hall.txt
//! ...
//! next
//! ```

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::reflect::{Properties, Reflect};
use crate::serialize::text;

/// Directory maps are authored in.
pub const WORLD_MAP_DIR: &str = "WorldMaps";
/// Directory in-game saves of maps are written to.
pub const GAME_SAVE_DIR: &str = "GameSaves";

#[derive(Debug, Clone, PartialEq)]
pub struct GameInstance {
    /// Load maps from [`GAME_SAVE_DIR`] instead of [`WORLD_MAP_DIR`].
    pub use_game_saves: bool,
    pub starting_map: String,
    pub previous_map: String,
    pub continue_map: String,
    /// Collected tags, one per line.
    collected: String,
}

impl Default for GameInstance {
    fn default() -> Self {
        Self {
            use_game_saves: false,
            starting_map: "start.txt".to_owned(),
            previous_map: "start.txt".to_owned(),
            continue_map: String::new(),
            collected: String::new(),
        }
    }
}

impl Reflect for GameInstance {
    fn props(&mut self) -> Properties<'_> {
        let mut props = Properties::new("Game Instance");
        props.add("Use Game Saves", &mut self.use_game_saves);
        props.add("Starting Map", &mut self.starting_map);
        props.add("Previous Map", &mut self.previous_map);
        props.add("Continue Map", &mut self.continue_map);
        props.add("Collected", &mut self.collected);
        props
    }
}

impl GameInstance {
    /// Where `map` is read from, given the save mode.
    pub fn map_path(&self, root: impl AsRef<Path>, map: &str) -> PathBuf {
        let dir = if self.use_game_saves {
            GAME_SAVE_DIR
        } else {
            WORLD_MAP_DIR
        };
        root.as_ref().join(dir).join(map)
    }

    /// Record leaving `from` for `to`; `to` becomes the continue point.
    pub fn travel(&mut self, from: &str, to: &str) {
        self.previous_map = from.to_owned();
        self.continue_map = to.to_owned();
    }

    /// Add `tag` to the collection. Returns `false` if it was already there.
    /// Blank tags and tags spanning lines are ignored.
    pub fn collect(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || tag.contains('\n') || self.has_collected(tag) {
            return false;
        }
        if !self.collected.is_empty() {
            self.collected.push('\n');
        }
        self.collected.push_str(tag);
        true
    }

    pub fn has_collected(&self, tag: &str) -> bool {
        self.collected().any(|t| t == tag)
    }

    pub fn collected(&self) -> impl Iterator<Item = &str> {
        self.collected.lines().filter(|t| !t.is_empty())
    }

    // ── Save / load ──────────────────────────────────────────────────

    pub fn save_text(&mut self) -> String {
        text::to_text(&self.props())
    }

    /// Overwrite the fields present in `input`. Unknown names are skipped.
    pub fn load_text(&mut self, input: &str) -> Result<()> {
        text::from_text(&mut self.props(), input)
    }

    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.save_text())?;
        log::info!("Saved game instance to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let input = std::fs::read_to_string(path.as_ref())?;
        self.load_text(&input)?;
        log::info!("Loaded game instance from {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn file_round_trip() {
        let mut game = GameInstance {
            use_game_saves: true,
            ..GameInstance::default()
        };
        game.travel("church_hall.txt", "crypt.txt");
        assert!(game.collect("bell tower"));
        assert!(game.collect("crypt door"));
        assert!(!game.collect("bell tower"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instance.txt");
        game.save_file(&path).unwrap();

        let mut loaded = GameInstance::default();
        loaded.load_file(&path).unwrap();
        assert_eq!(loaded, game);
        assert_eq!(loaded.collected().collect::<Vec<_>>(), ["bell tower", "crypt door"]);
        assert_eq!(loaded.previous_map, "church_hall.txt");
        assert_eq!(loaded.continue_map, "crypt.txt");
    }

    #[test]
    fn map_path_follows_save_mode() {
        let mut game = GameInstance::default();
        assert_eq!(game.map_path("assets", "a.txt"), Path::new("assets/WorldMaps/a.txt"));
        game.use_game_saves = true;
        assert_eq!(game.map_path("assets", "a.txt"), Path::new("assets/GameSaves/a.txt"));
    }

    #[test]
    fn partial_block_keeps_other_fields() {
        let mut game = GameInstance::default();
        game.load_text("Continue Map\nvault.txt\nUnknown\n1\nnext\n").unwrap();
        assert_eq!(game.continue_map, "vault.txt");
        assert_eq!(game.starting_map, "start.txt");
        assert!(matches!(
            game.load_text("Use Game Saves\nmaybe\nnext\n"),
            Err(EngineError::Parse { line: 2, .. })
        ));
    }
}
