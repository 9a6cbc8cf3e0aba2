pub mod checkpoint;
pub mod entry;
pub mod error;
pub mod lang;
pub mod migaku;

pub use checkpoint::*;
pub use entry::*;
pub use error::*;
pub use lang::*;
pub use migaku::*;
