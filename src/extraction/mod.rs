pub mod candidates;
pub mod executor;
pub mod prompts;
