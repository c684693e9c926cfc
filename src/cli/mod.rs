mod app;
mod commands;
mod config;
mod context;
mod dispatch;
mod env;
mod output;
mod plan;
mod runtime;

pub use app::run;
