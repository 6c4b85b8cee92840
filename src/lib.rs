// src/lib.rs
pub mod cli;
pub mod collection;
pub mod grid;
pub mod settings;
