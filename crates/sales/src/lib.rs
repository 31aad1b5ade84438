//! Sales orders (event-sourced), including the free-goods scheme.
//!
//! Pure domain logic; product data used by the free scheme is passed in by
//! the caller.

pub mod order;

pub use order::{
    AddFreeUnits, AddLine, ConfirmOrder, CreateSalesOrder, FREE_DISCOUNT_PERCENT,
    FreeUnitsIncreased, LineAdded, OrderConfirmed, OrderLine, SalesOrder, SalesOrderCommand,
    SalesOrderCreated, SalesOrderEvent, SalesOrderId, SalesOrderStatus,
};
