//! Single-writer command loop owning the engine and side stores.

/// Event stream payloads emitted by the runtime.
pub mod events;
/// Cloneable handle and the command loop implementation.
pub mod handle;
