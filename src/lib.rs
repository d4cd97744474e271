// Library target shared by the `spellbee` binary, the integration tests and
// the criterion benchmarks.

pub mod app;
pub mod config;
pub mod engine;
pub mod ids;
pub mod play;
pub mod session;
pub mod store;
pub mod words;
