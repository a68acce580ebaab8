pub mod inbox;
pub mod wiring;

pub use inbox::*;
pub use wiring::*;
