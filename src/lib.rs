// Library surface for headless/integration tests and reuse.
// The binary in main.rs only adds the terminal loop and CLI on top.
pub mod app_dirs;
pub mod audio;
pub mod best_score;
pub mod clock;
pub mod config;
pub mod hit;
pub mod melody;
pub mod runtime;
pub mod session;
pub mod share;
pub mod slot;
#[cfg(feature = "sound")]
pub mod speaker;
pub mod spawn;
pub mod timer;
pub mod ui;

pub use session::{Command, Phase, Session, SessionConfig, Snapshot};
