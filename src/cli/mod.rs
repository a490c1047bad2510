pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod globals;
pub mod start;
pub mod telemetry;

pub use self::start::start;
pub use self::telemetry::shutdown_tracer;
