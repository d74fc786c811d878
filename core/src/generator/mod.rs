use crate::*;
pub use random::*;

mod random;

pub trait MineGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout>;
}

/// A layout decided in advance, handy for tests and replays.
impl MineGenerator for MineLayout {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        if self.game_config() == config {
            Ok(self)
        } else {
            Err(GameError::InvalidBoardShape)
        }
    }
}
