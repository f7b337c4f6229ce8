pub mod kinds;
pub mod resources;

pub mod util;
