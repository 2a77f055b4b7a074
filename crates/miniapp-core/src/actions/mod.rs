//! Host actions defined by the protocol.

mod add_mini_app;
mod sign_in;

pub use add_mini_app::{AddMiniApp, AddMiniAppError, AddMiniAppResult};
pub use sign_in::{SignIn, SignInError, SignInParams, SignInResult};
