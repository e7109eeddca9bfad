pub mod config;
pub mod extractor;
pub mod handler;
pub mod ical;
pub mod merge;
pub mod model;
pub mod renderer;
pub mod tickets;
