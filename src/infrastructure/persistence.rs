// ============================================================
// PERSISTENCE COLLABORATOR
// ============================================================
// The engine hands finished records to this boundary and holds no
// reference to them afterwards. Relational storage lives on the other
// side of the trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::boq::{BillOfQuantities, BoqItem, BoqStatus, ParsedBoqItem};
use crate::domain::error::{AppError, Result};

#[async_trait]
pub trait BoqRepository: Send + Sync {
    /// Persist a BOQ shell so a stable id exists before confirmation.
    async fn create_boq(&self, filename: &str) -> Result<BillOfQuantities>;

    async fn get_boq(&self, id: i64) -> Result<BillOfQuantities>;

    /// Pending -> Confirmed; the shell's only transition.
    async fn mark_confirmed(&self, id: i64) -> Result<()>;

    /// Replace the BOQ's durable line items with the confirmed set.
    /// Replacement (not append) keeps repeated confirms idempotent.
    async fn replace_items(&self, boq_id: i64, items: &[ParsedBoqItem]) -> Result<Vec<BoqItem>>;

    async fn list_items(&self, boq_id: i64) -> Result<Vec<BoqItem>>;
}

#[derive(Default)]
struct MemoryState {
    next_boq_id: i64,
    next_item_id: i64,
    boqs: HashMap<i64, BillOfQuantities>,
    items: HashMap<i64, Vec<BoqItem>>,
}

/// In-memory repository. A single lock per call keeps each write atomic
/// from the caller's perspective.
#[derive(Default)]
pub struct InMemoryBoqRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryBoqRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoqRepository for InMemoryBoqRepository {
    async fn create_boq(&self, filename: &str) -> Result<BillOfQuantities> {
        let mut state = self.state.lock().await;
        state.next_boq_id += 1;
        let boq = BillOfQuantities {
            id: state.next_boq_id,
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
            status: BoqStatus::Pending,
        };
        state.boqs.insert(boq.id, boq.clone());
        Ok(boq)
    }

    async fn get_boq(&self, id: i64) -> Result<BillOfQuantities> {
        let state = self.state.lock().await;
        state
            .boqs
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("BillOfQuantities id {}", id)))
    }

    async fn mark_confirmed(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let boq = state
            .boqs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("BillOfQuantities id {}", id)))?;
        boq.status = BoqStatus::Confirmed;
        Ok(())
    }

    async fn replace_items(&self, boq_id: i64, items: &[ParsedBoqItem]) -> Result<Vec<BoqItem>> {
        let mut state = self.state.lock().await;
        if !state.boqs.contains_key(&boq_id) {
            return Err(AppError::NotFound(format!("BillOfQuantities id {}", boq_id)));
        }

        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            state.next_item_id += 1;
            stored.push(BoqItem {
                id: state.next_item_id,
                boq_id,
                item_number: item.item_number.clone(),
                description: item.description.clone(),
                material_type: item.material_type.clone(),
                quantity: item.quantity.clone(),
                unit: item.unit.clone(),
                specification: item.specification.clone(),
                notes: item.notes.clone(),
                has_parsing_errors: item.has_parsing_errors,
            });
        }
        state.items.insert(boq_id, stored.clone());
        Ok(stored)
    }

    async fn list_items(&self, boq_id: i64) -> Result<Vec<BoqItem>> {
        let state = self.state.lock().await;
        Ok(state.items.get(&boq_id).cloned().unwrap_or_default())
    }
}
