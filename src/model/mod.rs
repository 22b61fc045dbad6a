//! Model types shared by the data source, controller and views.

mod device;
mod time;

pub use device::*;
pub use time::*;
