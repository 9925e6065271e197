// libs/appointment-cell/src/services/consistency.rs
//
// Slot claim table. One claim per (provider, start instant), shared by every
// slot list handed out, so two callers holding separately generated copies
// of the same slot still contend on the same key.
//

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use doctor_cell::models::SlotKey;

use crate::models::AppointmentId;
use crate::services::registry::AppointmentRegistry;

const RESERVATION_PREFIX: &str = "~reserved-";

#[derive(Default)]
pub struct SlotBookingCoordinator {
    claims: DashMap<SlotKey, AppointmentId>,
    next_reservation: AtomicU64,
}

impl SlotBookingCoordinator {
    pub fn new() -> Self {
        Self {
            claims: DashMap::new(),
            next_reservation: AtomicU64::new(1),
        }
    }

    /// Claim `key` for `appointment_id`. Check and claim happen under the
    /// key's entry lock; an occupied key fails without side effect.
    pub fn try_book(&self, key: &SlotKey, appointment_id: &str) -> bool {
        match self.claims.entry(key.clone()) {
            Entry::Occupied(existing) => {
                warn!("Slot {} already held by {}, rejecting {}", key, existing.get(), appointment_id);
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(appointment_id.to_string());
                debug!("Slot {} claimed by {}", key, appointment_id);
                true
            }
        }
    }

    /// Claim `key` for a caller that has no appointment id yet. The returned
    /// token holds the slot until `assign` swaps in the real id or
    /// `release_if_held_by` drops it.
    pub fn try_reserve(&self, key: &SlotKey) -> Option<AppointmentId> {
        let number = self.next_reservation.fetch_add(1, Ordering::SeqCst);
        let token = format!("{}{}", RESERVATION_PREFIX, number);
        self.try_book(key, &token).then_some(token)
    }

    /// Hand a reserved claim over to `appointment_id`. Fails when `token` no
    /// longer holds the key.
    pub fn assign(&self, key: &SlotKey, token: &str, appointment_id: &str) -> bool {
        match self.claims.get_mut(key) {
            Some(mut holder) if holder.as_str() == token => {
                *holder = appointment_id.to_string();
                debug!("Slot {} reservation {} assigned to {}", key, token, appointment_id);
                true
            }
            _ => false,
        }
    }

    /// Unconditionally clear the claim on `key`, returning the previous holder.
    pub fn release(&self, key: &SlotKey) -> Option<AppointmentId> {
        let released = self.claims.remove(key).map(|(_, holder)| holder);
        if let Some(holder) = &released {
            debug!("Slot {} released from {}", key, holder);
        }
        released
    }

    /// Clear the claim only if `appointment_id` holds it.
    pub fn release_if_held_by(&self, key: &SlotKey, appointment_id: &str) -> bool {
        let released = self
            .claims
            .remove_if(key, |_, holder| holder == appointment_id)
            .is_some();
        if released {
            debug!("Slot {} released by {}", key, appointment_id);
        }
        released
    }

    pub fn holder(&self, key: &SlotKey) -> Option<AppointmentId> {
        self.claims.get(key).map(|entry| entry.value().clone())
    }

    pub fn is_claimed(&self, key: &SlotKey) -> bool {
        self.claims.contains_key(key)
    }

    pub fn claimed_count(&self) -> usize {
        self.claims.len()
    }

    /// Seed claims from the live appointments already in `registry`.
    pub fn rebuild_from(&self, registry: &AppointmentRegistry) {
        let mut seeded = 0;
        for appointment in registry.find_all() {
            let Some(id) = appointment.id.as_deref() else {
                continue;
            };
            if appointment.is_live() && self.try_book(&appointment.slot_key(), id) {
                seeded += 1;
            }
        }
        info!("Seeded {} slot claims from registry", seeded);
    }
}
