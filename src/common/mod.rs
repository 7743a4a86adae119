mod position;

pub use position::{Location, Position};
