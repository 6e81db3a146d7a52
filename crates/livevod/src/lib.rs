pub mod config;
pub mod controls;
pub mod coordinator;
pub mod display;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod seek;
pub mod session;
pub mod time;
pub mod view;

mod util;

pub use config::SessionConfig;
pub use coordinator::{Coordinator, Effect, FetchPurpose, PlaybackMode};
pub use engine::{
    Cue, EngineEvent, EngineEvents, EngineFactory, EngineId, PlayerDelegate, PlayerEngine,
    PlayerHandle, PlayerSlot, PlayerState,
};
pub use error::{LivevodError, LivevodResult};
pub use metadata::{HttpMetadataProvider, MetadataProvider, StreamMetadata};
pub use seek::{SeekStatus, TouchPhase};
pub use session::{PlayerSession, SessionEvent, UserCommand};
pub use time::MediaTime;
pub use util::http::HttpClient;
pub use view::ViewState;
