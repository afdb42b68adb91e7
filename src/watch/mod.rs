// src/watch/mod.rs

//! File watching.
//!
//! [`subscribe`] turns `notify` events under a root into a stream of
//! [`ChangeEvent`]s filtered by a pattern set. [`spawn_bindings`] links each
//! stream to a task name and forwards triggers to the runtime. Nothing here
//! knows about overlap policy; that lives in the engine.

pub mod binding;
pub mod subscription;

pub use binding::{WatchBinding, WatchHandle, spawn_bindings, standard_bindings};
pub use subscription::{ChangeEvent, Subscription, subscribe};
