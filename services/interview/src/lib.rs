pub mod config;
pub mod gemini_adapter;
pub mod prompt_loader;
pub mod runtime;
pub mod speech_host;
pub mod view;
