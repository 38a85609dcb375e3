// Media submission bot - server core
//
// Chat events become submissions, reviewers approve or reject them with
// reactions, and a scheduled (or manual) sweep publishes every submission
// that has at least one approval and no rejections.
//
// Domains live in domains/*; infrastructure traits and adapters in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
