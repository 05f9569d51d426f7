pub mod generate;
pub mod keywords;
pub mod matching;
pub mod pitch;
pub mod slug;
pub mod templates;

pub use pitch::{PitchStatus, PitchTransitionError};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
