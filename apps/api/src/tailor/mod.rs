// Resume tailoring: input checks, prompt assembly, and the streamed update feed.
// All model calls go through llm_client::TextGenerator.

pub mod assembler;
pub mod clear;
pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod validation;
