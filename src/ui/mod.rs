//! Chat-facing output: reply values, their embeds, and the sink that posts them.

pub mod embeds;
pub mod reply;
