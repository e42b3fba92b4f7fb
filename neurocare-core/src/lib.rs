pub mod achievements;
pub mod comparative;
pub mod permissions;
pub mod progress;
pub mod report;
pub mod risk;
pub mod sample;
pub mod stats;
pub mod streak;

// Re-export main components
pub use achievements::*;
pub use comparative::*;
pub use permissions::*;
pub use progress::*;
pub use report::*;
pub use risk::*;
pub use sample::*;
pub use streak::*;
