//! Domain data types

pub mod records;
pub mod reference;
pub mod session;

pub use records::*;
pub use reference::*;
pub use session::*;
