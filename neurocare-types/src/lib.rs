pub mod analytics;
pub mod errors;
pub mod game;
pub mod gamification;
pub mod notification;
pub mod patient;
pub mod report;
pub mod risk;
pub mod user;

// Re-export all types
pub use analytics::*;
pub use errors::*;
pub use game::*;
pub use gamification::*;
pub use notification::*;
pub use patient::*;
pub use report::*;
pub use risk::*;
pub use user::*;
