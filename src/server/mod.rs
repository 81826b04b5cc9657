// Server module entry point
// Listener setup, per-connection serving, the accept loop and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export common entry points
pub use listener::create_listener;
pub use server_loop::run;
pub use signal::shutdown_signal;
