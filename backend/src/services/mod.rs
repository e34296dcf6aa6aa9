//! Business logic services for the Pharmacy Inventory Management System

pub mod customers;
pub mod document_id;
pub mod finance;
pub mod ledger;
pub mod products;
pub mod purchase;
pub mod returns;
pub mod sales;
pub mod stock;
pub mod stocktake;
pub mod suppliers;
pub mod tx;

pub use customers::CustomerService;
pub use finance::FinanceService;
pub use products::ProductService;
pub use purchase::PurchaseService;
pub use returns::ReturnsService;
pub use sales::SalesService;
pub use stock::StockService;
pub use stocktake::StocktakeService;
pub use suppliers::SupplierService;
