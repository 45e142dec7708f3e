pub mod account;
pub mod auth;
pub mod interactions;

pub use account::AccountLifecycle;
pub use auth::{AuthService, NewUser, ProfileChanges};
pub use interactions::{InteractionEngine, NewPost};
