pub mod carousel;
pub mod coordinator;
pub mod derive;
pub mod engine;
pub mod event;
pub mod input;
pub mod scroll;
pub mod stage;

pub use carousel::{Carousel, IndexChange, WindowSlot};
pub use coordinator::{ChromeVisibility, LockCoordinator, LockGuard};
pub use derive::{DerivationTable, DerivedParameters};
pub use engine::{DetailView, Engine, EngineSnapshot, LoadStatus};
pub use event::{Action, DeepLink, EngineEvent, EngineNotice, InputEvent};
pub use stage::{Stage, StageMachine, StageTransition, TransitionCause};
