pub mod policy;
pub mod status;

pub use policy::*;
pub use status::*;
