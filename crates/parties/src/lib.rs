//! Contacts: customers and suppliers.
//!
//! Suppliers carry a licensing/logistics profile (drug and food license
//! numbers, delivery lead time, transport mode, place of delivery) that
//! purchase orders copy as defaults, plus the acceptance criteria their goods
//! are inspected against.

pub mod party;

pub use party::{
    AcceptanceCriteriaSet, AcceptanceCriterion, ContactInfo, CriterionId, Party, PartyCommand,
    PartyEvent, PartyId, PartyKind, PartyRegistered, PartyUpdated, RegisterParty,
    SetAcceptanceCriteria, SupplierProfile, SupplierProfileUpdated, UpdateDetails,
    UpdateSupplierProfile,
};
