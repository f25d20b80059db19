// src/ports/mod.rs
pub mod http;
