pub mod event;
pub mod level;
pub mod step;
pub mod view;
pub mod world;
