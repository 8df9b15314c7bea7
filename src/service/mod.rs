//! Business operations. Handlers authorize the caller, then delegate here;
//! everything below works only through the repository traits.

pub mod attendance;
pub mod directory;
pub mod leave;
