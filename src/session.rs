use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, SourcingError};
use crate::models::{ExtractedRequirement, Quotation, Supplier, UserIdentity};

/// Where a chat session is in the selection/quotation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    SuppliersShown,
    SelectionChanged,
    AwaitingQuotations,
    QuotationsReceived,
}

/// Explicit per-session context, passed to every component and persisted
/// through a `SessionRepository`. Replaces the original design's ambient
/// browser-local-storage access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user: Option<UserIdentity>,
    pub requirement: ExtractedRequirement,
    /// Last parsed supplier batch; ids are meaningful only within it
    pub suppliers: Vec<Supplier>,
    pub selections: HashMap<u32, bool>,
    /// Snapshot of the suppliers that were selected when the notification
    /// went out; the synthetic-quotation fallback draws from this
    pub selected_snapshot: Vec<Supplier>,
    /// Tracking identifier returned by the notification service
    pub requirement_id: Option<String>,
    pub pending_request: bool,
    pub phase: SessionPhase,
    pub quotations: Vec<Quotation>,
}

impl SessionContext {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            user: None,
            requirement: ExtractedRequirement::default(),
            suppliers: Vec::new(),
            selections: HashMap::new(),
            selected_snapshot: Vec::new(),
            requirement_id: None,
            pending_request: false,
            phase: SessionPhase::Idle,
            quotations: Vec::new(),
        }
    }

    /// Fold a fresh extraction into the session requirement (non-null wins,
    /// null never erases)
    pub fn merge_requirement(&mut self, newer: &ExtractedRequirement) {
        self.requirement.merge_from(newer);
    }

    /// Record a freshly parsed supplier batch. Ids from any earlier batch are
    /// invalidated, so the selection mapping is reset.
    pub fn show_suppliers(&mut self, batch: Vec<Supplier>) {
        self.suppliers = batch;
        self.selections.clear();
        self.phase = SessionPhase::SuppliersShown;
    }

    /// Toggle one supplier in the current batch
    pub fn toggle_selection(&mut self, supplier_id: u32, selected: bool) -> Result<()> {
        if !self.suppliers.iter().any(|s| s.id == supplier_id) {
            return Err(SourcingError::Validation(format!(
                "No supplier with id {supplier_id} in the current batch"
            )));
        }
        if !matches!(
            self.phase,
            SessionPhase::SuppliersShown | SessionPhase::SelectionChanged
        ) {
            return Err(SourcingError::Validation(
                "No supplier list is awaiting selection".to_string(),
            ));
        }
        self.selections.insert(supplier_id, selected);
        self.phase = SessionPhase::SelectionChanged;
        Ok(())
    }

    /// Suppliers currently toggled on, in batch order
    pub fn selected_suppliers(&self) -> Vec<&Supplier> {
        self.suppliers
            .iter()
            .filter(|s| self.selections.get(&s.id).copied().unwrap_or(false))
            .collect()
    }

    /// A notification went out and the service acknowledged it
    pub fn record_notification(&mut self, requirement_id: String) {
        self.selected_snapshot = self.selected_suppliers().into_iter().cloned().collect();
        self.requirement_id = Some(requirement_id);
        self.pending_request = true;
        self.phase = SessionPhase::AwaitingQuotations;
    }

    /// Quotations arrived (real or synthetic)
    pub fn record_quotations(&mut self, quotations: Vec<Quotation>) {
        self.quotations = quotations;
        self.pending_request = false;
        self.phase = SessionPhase::QuotationsReceived;
    }
}
