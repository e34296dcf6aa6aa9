//! HTTP handlers for the Pharmacy Inventory Management System

pub mod customers;
pub mod finance;
pub mod products;
pub mod purchase;
pub mod returns;
pub mod sales;
pub mod stock;
pub mod stocktake;
pub mod suppliers;

pub use customers::*;
pub use finance::*;
pub use products::*;
pub use purchase::*;
pub use returns::*;
pub use sales::*;
pub use stock::*;
pub use stocktake::*;
pub use suppliers::*;
