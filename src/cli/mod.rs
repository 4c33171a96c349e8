pub mod chart;
pub mod logos;
pub mod setup;
pub mod ui;
pub mod watch;
