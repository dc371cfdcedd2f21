pub mod event;
pub mod level;
pub mod reward;
pub mod step;
pub mod world;
