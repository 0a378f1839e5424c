//! The arithmetic core of the billing engine, kept free of I/O so the
//! invariants are checkable without a database: grouping billable time into
//! per-employee line candidates, composing an invoice subtotal from its three
//! charge sources, and clamping the discount.

use bigdecimal::{BigDecimal, Zero};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{InvoiceFee, InvoiceLine, InvoiceManualLine, TimeEntry};

/// One draft line candidate: an employee's summed hours plus the entry ids
/// that produced them, so the entries can be linked to the invoice.
#[derive(Debug, Clone)]
pub struct EmployeeHours {
    pub employee_id: Uuid,
    pub hours: BigDecimal,
    pub entry_ids: Vec<Uuid>,
}

/// Groups eligible time entries by employee, summing hours. The caller has
/// already filtered for billable/normal/unlinked; this only aggregates.
pub fn group_by_employee(entries: &[TimeEntry]) -> Vec<EmployeeHours> {
    let mut groups: BTreeMap<Uuid, EmployeeHours> = BTreeMap::new();
    for entry in entries {
        let group = groups
            .entry(entry.employee_id)
            .or_insert_with(|| EmployeeHours {
                employee_id: entry.employee_id,
                hours: BigDecimal::zero(),
                entry_ids: Vec::new(),
            });
        group.hours += &entry.hours;
        group.entry_ids.push(entry.id);
    }
    groups.into_values().collect()
}

/// Invariant: subtotal is always the sum over all three child collections,
/// never an incremental adjustment of a previous value.
pub fn subtotal(
    lines: &[InvoiceLine],
    manual_lines: &[InvoiceManualLine],
    fees: &[InvoiceFee],
) -> BigDecimal {
    let mut sum = BigDecimal::zero();
    for line in lines {
        sum += &line.amount;
    }
    for line in manual_lines {
        sum += &line.line_total;
    }
    for fee in fees {
        sum += &fee.fee_total;
    }
    sum
}

/// Clamps a discount into `[0, subtotal]` so the resulting total can never go
/// negative.
pub fn clamp_discount(subtotal: &BigDecimal, discount: &BigDecimal) -> BigDecimal {
    if discount < &BigDecimal::zero() {
        BigDecimal::zero()
    } else if discount > subtotal {
        subtotal.clone()
    } else {
        discount.clone()
    }
}

pub fn line_amount(hours: &BigDecimal, rate: &BigDecimal) -> BigDecimal {
    hours * rate
}
