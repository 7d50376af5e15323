//! HTTP Handlers

mod history;
mod ping;
mod transform;
mod voice;

pub use history::*;
pub use ping::*;
pub use transform::*;
pub use voice::*;
