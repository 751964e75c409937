//! Editor window: egui side panels around the software-rendered canvas

mod app;
mod components;
mod constants;

pub use app::{run_gui, Services};
