pub mod cursor;
pub mod key;
pub mod pacing;
pub mod stagnation;

pub use cursor::FeedCursor;
pub use key::{resolve_key, KeyInput};
pub use pacing::{DisabledPacing, HumanPacing, Pacing};
pub use stagnation::StagnationTracker;
