pub mod batch;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod enhance;
pub mod error;
pub mod export;
pub mod finisher;
pub mod font;
pub mod naming;
pub mod numbering;
pub mod pdf;
pub mod pipeline;
pub mod range;
pub mod report;
pub mod strip;
pub mod util;
