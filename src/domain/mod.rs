mod catalog;
mod discount;
mod error;
mod input;
mod money;
mod order;
mod receipt;

pub use catalog::*;
pub use discount::*;
pub use error::*;
pub use input::*;
pub use money::*;
pub use order::*;
pub use receipt::*;
