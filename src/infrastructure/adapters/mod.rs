//! Adapters - BotApi and UpdateSource implementations

pub mod console;
pub mod memory;

pub use console::ConsoleAdapter;
pub use memory::MemoryAdapter;
