// Ensemble module - Links between devices that play together

pub mod linker;

pub use linker::Linker;
