//! Donation transition table
//!
//! One exhaustive match is the single source of truth for edge legality and
//! role gating. Both `transition` and `deliver` consult it, so the guard
//! cannot drift between the two entry points.

use crate::types::{DonationStatus, Role};

/// Roles allowed to take the edge `(from, to)`; empty when the edge does not
/// exist. `delivered` has no outgoing edges.
pub fn allowed_roles(from: DonationStatus, to: DonationStatus) -> &'static [Role] {
    use DonationStatus::*;
    match (from, to) {
        // Donor-initiated funding kept for the legacy intake path.
        (Pending, Funded) => &[Role::Donor, Role::Ngo, Role::Admin],
        (Funded, Assigned) => &[Role::Ngo, Role::Admin],
        (Assigned, Delivered) => &[Role::Ngo, Role::Admin],
        _ => &[],
    }
}

/// True when `role` may move a donation from `from` to `to`
pub fn can_transition(from: DonationStatus, to: DonationStatus, role: Role) -> bool {
    allowed_roles(from, to).contains(&role)
}
