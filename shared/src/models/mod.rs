//! Domain models for the Pharmacy Inventory Management System

mod batch;
mod customer;
mod finance;
mod order;
mod product;
mod returns;
mod stocktake;
mod supplier;

pub use batch::*;
pub use customer::*;
pub use finance::*;
pub use order::*;
pub use product::*;
pub use returns::*;
pub use stocktake::*;
pub use supplier::*;
