pub mod commands;
pub mod completion;
pub mod context;
pub mod error;
pub mod http;
pub mod normalize;
pub mod note;
pub mod prompt;
pub mod relocate;
pub mod session;
pub mod settings;
pub mod types;

pub use error::*;
pub use types::*;
