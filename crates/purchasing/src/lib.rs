//! Purchasing domain: purchase orders with receiving progress and lot-wise
//! breakdowns, and vendor bills reconciled against purchase lines.
//!
//! Deterministic domain logic only; currency conversion is supplied by the
//! caller through [`bill::CurrencyConverter`].

pub mod bill;
pub mod lot_split;
pub mod order;

pub use bill::{
    AddBillLine, BillCreated, BillLine, BillLineAdded, BillPosted, BillStatus, CreateBill,
    CurrencyConverter, MergePurchaseMatches, PostBill, PricedMatch, PurchaseLineRef,
    PurchaseMatch, PurchaseMatchesMerged, VendorBill, VendorBillCommand, VendorBillEvent,
    VendorBillId,
};
pub use lot_split::{LotAnnotation, split_by_lot};
pub use order::{
    AddLine, Approve, CreatePurchaseOrder, GoodsReceived, LineItem, Logistics, LogisticsUpdated,
    LotSplitHidden, LotSplitShown, MrpDisplay, OrderType, PurchaseOrder, PurchaseOrderApproved,
    PurchaseOrderCommand, PurchaseOrderCreated, PurchaseOrderEvent, PurchaseOrderId,
    PurchaseOrderLineAdded, PurchaseOrderStatus, ReceiptProgress, ReceiveGoods, ReceivedMove,
    TestCertificate, ToggleLotWise, UpdateLogistics,
};
