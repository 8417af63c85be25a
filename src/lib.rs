pub mod agent;
pub mod callbacks;
pub mod config;
pub mod llm;
pub mod memory;
pub mod output_parser;
pub mod schemas;
pub mod template;
pub mod tools;
