pub mod gate;
pub mod recorder;
