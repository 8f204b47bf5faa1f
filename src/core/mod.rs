//! Core protocol types: command vocabulary and the task slot

pub mod command;
pub mod slot;

pub use command::Command;
pub use slot::{SlotGuard, TaskKind, TaskSlot};
