//! Public surface of the slotted-page heap-file document storage engine:
//! [`Engine::open`]/[`Engine::insert`]/[`Engine::find`]/[`Engine::remove`]
//! over a single backing file, plus the document-boundary module and the
//! error type those operations return.

pub mod documents;
pub mod engine;
pub mod error;
pub mod rid;

pub use engine::Engine;
pub use error::DmsError;
pub use rid::Rid;
