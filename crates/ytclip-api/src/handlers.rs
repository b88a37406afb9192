//! Request handlers.

pub mod admin;
pub mod clip;
pub mod health;
pub mod jobs;
pub mod video;

pub use admin::*;
pub use clip::*;
pub use health::*;
pub use jobs::*;
pub use video::*;
