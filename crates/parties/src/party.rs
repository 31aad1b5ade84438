use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use batchline_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId, uuid_newtype};
use batchline_events::Event;

/// Party identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(pub AggregateId);

impl PartyId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

uuid_newtype! {
    /// Entry of the acceptance-criteria master list ("Color", "pH", ...).
    pub struct CriterionId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer,
    Supplier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Regulatory and logistics data kept on a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProfile {
    /// Lead time in days.
    pub delivery_time_days: Option<u32>,
    pub drug_license_no: Option<String>,
    pub food_license_no: Option<String>,
    pub mode_of_transport: Option<String>,
    pub place_of_delivery: Option<String>,
}

/// A criterion a supplier's goods are accepted against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub criterion_id: CriterionId,
    pub name: String,
}

/// Aggregate root: Party (customer or supplier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    id: PartyId,
    tenant_id: Option<TenantId>,
    kind: PartyKind,
    name: String,
    contact: ContactInfo,
    supplier_profile: SupplierProfile,
    acceptance_criteria: Vec<AcceptanceCriterion>,
    version: u64,
    created: bool,
}

impl Party {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PartyId) -> Self {
        Self {
            id,
            tenant_id: None,
            kind: PartyKind::Customer,
            name: String::new(),
            contact: ContactInfo::default(),
            supplier_profile: SupplierProfile::default(),
            acceptance_criteria: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PartyId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn kind(&self) -> PartyKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn supplier_profile(&self) -> &SupplierProfile {
        &self.supplier_profile
    }

    pub fn acceptance_criteria(&self) -> &[AcceptanceCriterion] {
        &self.acceptance_criteria
    }

    pub fn is_supplier(&self) -> bool {
        self.kind == PartyKind::Supplier
    }
}

impl AggregateRoot for Party {
    type Id = PartyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterParty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterParty {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub kind: PartyKind,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    /// `None` keeps the current name.
    pub name: Option<String>,
    /// `None` keeps the current contact info.
    pub contact: Option<ContactInfo>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateSupplierProfile (replaces the whole profile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSupplierProfile {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub profile: SupplierProfile,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetAcceptanceCriteria (replaces the supplier's criteria list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetAcceptanceCriteria {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub criteria: Vec<AcceptanceCriterion>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyCommand {
    RegisterParty(RegisterParty),
    UpdateDetails(UpdateDetails),
    UpdateSupplierProfile(UpdateSupplierProfile),
    SetAcceptanceCriteria(SetAcceptanceCriteria),
}

/// Event: PartyRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyRegistered {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub kind: PartyKind,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PartyUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyUpdated {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub name: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierProfileUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierProfileUpdated {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub profile: SupplierProfile,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AcceptanceCriteriaSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriteriaSet {
    pub tenant_id: TenantId,
    pub party_id: PartyId,
    pub criteria: Vec<AcceptanceCriterion>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyEvent {
    PartyRegistered(PartyRegistered),
    PartyUpdated(PartyUpdated),
    SupplierProfileUpdated(SupplierProfileUpdated),
    AcceptanceCriteriaSet(AcceptanceCriteriaSet),
}

impl Event for PartyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PartyEvent::PartyRegistered(_) => "parties.party.registered",
            PartyEvent::PartyUpdated(_) => "parties.party.updated",
            PartyEvent::SupplierProfileUpdated(_) => "parties.party.supplier_profile_updated",
            PartyEvent::AcceptanceCriteriaSet(_) => "parties.party.acceptance_criteria_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PartyEvent::PartyRegistered(e) => e.occurred_at,
            PartyEvent::PartyUpdated(e) => e.occurred_at,
            PartyEvent::SupplierProfileUpdated(e) => e.occurred_at,
            PartyEvent::AcceptanceCriteriaSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Party {
    type Command = PartyCommand;
    type Event = PartyEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PartyEvent::PartyRegistered(e) => {
                self.id = e.party_id;
                self.tenant_id = Some(e.tenant_id);
                self.kind = e.kind;
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.created = true;
            }
            PartyEvent::PartyUpdated(e) => {
                self.name = e.name.clone();
                self.contact = e.contact.clone();
            }
            PartyEvent::SupplierProfileUpdated(e) => {
                self.supplier_profile = e.profile.clone();
            }
            PartyEvent::AcceptanceCriteriaSet(e) => {
                self.acceptance_criteria = e.criteria.clone();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PartyCommand::RegisterParty(cmd) => self.handle_register(cmd),
            PartyCommand::UpdateDetails(cmd) => self.handle_update(cmd),
            PartyCommand::UpdateSupplierProfile(cmd) => self.handle_update_profile(cmd),
            PartyCommand::SetAcceptanceCriteria(cmd) => self.handle_set_criteria(cmd),
        }
    }
}

impl Party {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_existing(&self, tenant_id: TenantId, party_id: PartyId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        if self.id != party_id {
            return Err(DomainError::invariant("party_id mismatch"));
        }
        Ok(())
    }

    fn ensure_supplier(&self) -> Result<(), DomainError> {
        if !self.is_supplier() {
            return Err(DomainError::invariant(
                "supplier data can only be recorded on suppliers",
            ));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterParty) -> Result<Vec<PartyEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("party already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![PartyEvent::PartyRegistered(PartyRegistered {
            tenant_id: cmd.tenant_id,
            party_id: cmd.party_id,
            kind: cmd.kind,
            name: cmd.name.clone(),
            contact: cmd.contact.clone().unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateDetails) -> Result<Vec<PartyEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.party_id)?;

        let name = cmd.name.clone().unwrap_or_else(|| self.name.clone());
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![PartyEvent::PartyUpdated(PartyUpdated {
            tenant_id: cmd.tenant_id,
            party_id: cmd.party_id,
            name,
            contact: cmd.contact.clone().unwrap_or_else(|| self.contact.clone()),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_profile(
        &self,
        cmd: &UpdateSupplierProfile,
    ) -> Result<Vec<PartyEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.party_id)?;
        self.ensure_supplier()?;

        Ok(vec![PartyEvent::SupplierProfileUpdated(SupplierProfileUpdated {
            tenant_id: cmd.tenant_id,
            party_id: cmd.party_id,
            profile: cmd.profile.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_criteria(
        &self,
        cmd: &SetAcceptanceCriteria,
    ) -> Result<Vec<PartyEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.party_id)?;
        self.ensure_supplier()?;

        let mut seen = std::collections::HashSet::new();
        for criterion in &cmd.criteria {
            if criterion.name.trim().is_empty() {
                return Err(DomainError::validation("criterion name cannot be empty"));
            }
            if !seen.insert(criterion.criterion_id) {
                return Err(DomainError::validation(format!(
                    "criterion {} listed twice",
                    criterion.name
                )));
            }
        }

        Ok(vec![PartyEvent::AcceptanceCriteriaSet(AcceptanceCriteriaSet {
            tenant_id: cmd.tenant_id,
            party_id: cmd.party_id,
            criteria: cmd.criteria.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchline_events::execute;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_party_id() -> PartyId {
        PartyId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn registered(kind: PartyKind) -> (Party, TenantId, PartyId) {
        let tenant_id = test_tenant_id();
        let party_id = test_party_id();
        let mut party = Party::empty(party_id);
        execute(
            &mut party,
            &PartyCommand::RegisterParty(RegisterParty {
                tenant_id,
                party_id,
                kind,
                name: "Herbal Extracts Ltd".to_string(),
                contact: None,
                occurred_at: test_time(),
            }),
        )
        .unwrap();
        (party, tenant_id, party_id)
    }

    #[test]
    fn register_party_emits_party_registered_event() {
        let party = Party::empty(test_party_id());
        let tenant_id = test_tenant_id();
        let party_id = test_party_id();
        let contact = ContactInfo {
            email: Some("qa@herbal.example".to_string()),
            phone: None,
            address: Some("Navagam".to_string()),
        };

        let events = party
            .handle(&PartyCommand::RegisterParty(RegisterParty {
                tenant_id,
                party_id,
                kind: PartyKind::Supplier,
                name: "Herbal Extracts Ltd".to_string(),
                contact: Some(contact.clone()),
                occurred_at: test_time(),
            }))
            .unwrap();

        match &events[..] {
            [PartyEvent::PartyRegistered(e)] => {
                assert_eq!(e.party_id, party_id);
                assert_eq!(e.kind, PartyKind::Supplier);
                assert_eq!(e.contact, contact);
            }
            _ => panic!("Expected a single PartyRegistered event"),
        }
    }

    #[test]
    fn register_party_rejects_empty_name() {
        let party = Party::empty(test_party_id());
        let err = party
            .handle(&PartyCommand::RegisterParty(RegisterParty {
                tenant_id: test_tenant_id(),
                party_id: test_party_id(),
                kind: PartyKind::Supplier,
                name: "   ".to_string(),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn supplier_profile_is_replaced_on_update() {
        let (mut party, tenant_id, party_id) = registered(PartyKind::Supplier);
        let profile = SupplierProfile {
            delivery_time_days: Some(14),
            drug_license_no: Some("DL-20B-1123".to_string()),
            food_license_no: Some("FSSAI-10019".to_string()),
            mode_of_transport: Some("Road".to_string()),
            place_of_delivery: Some("Navagam".to_string()),
        };

        execute(
            &mut party,
            &PartyCommand::UpdateSupplierProfile(UpdateSupplierProfile {
                tenant_id,
                party_id,
                profile: profile.clone(),
                occurred_at: test_time(),
            }),
        )
        .unwrap();

        assert_eq!(party.supplier_profile(), &profile);
        assert_eq!(party.version(), 2);
    }

    #[test]
    fn customers_cannot_carry_supplier_profile() {
        let (party, tenant_id, party_id) = registered(PartyKind::Customer);
        let err = party
            .handle(&PartyCommand::UpdateSupplierProfile(UpdateSupplierProfile {
                tenant_id,
                party_id,
                profile: SupplierProfile::default(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn acceptance_criteria_reject_duplicates() {
        let (party, tenant_id, party_id) = registered(PartyKind::Supplier);
        let color = AcceptanceCriterion {
            criterion_id: CriterionId::new(),
            name: "Color".to_string(),
        };

        let err = party
            .handle(&PartyCommand::SetAcceptanceCriteria(SetAcceptanceCriteria {
                tenant_id,
                party_id,
                criteria: vec![color.clone(), color],
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("listed twice")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn update_requires_existing_party() {
        let party = Party::empty(test_party_id());
        let err = party
            .handle(&PartyCommand::UpdateDetails(UpdateDetails {
                tenant_id: test_tenant_id(),
                party_id: test_party_id(),
                name: Some("New".to_string()),
                contact: None,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
