use super::{rates, DatabaseConnection};
use crate::api::invoices::{CreateInvoice, PopulatedFee, PopulatedInvoice};
use crate::billing;
use crate::error::Error;
use crate::models::*;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

/// A unique violation on the junction means a concurrent writer claimed one
/// of the entries first.
fn link_conflict(e: diesel::result::Error) -> Error {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => Error::DuplicateBilling,
        other => Error::Database(other),
    }
}

/// Reads the invoice with a row lock, serializing all mutations of one
/// invoice for the duration of the surrounding transaction.
pub(super) async fn lock_invoice(
    conn: &mut AsyncPgConnection,
    invoice: Uuid,
) -> Result<Invoice, Error> {
    use crate::schema::invoices::dsl::*;

    invoices
        .find(invoice)
        .for_update()
        .first::<Invoice>(conn)
        .await
        .optional()?
        .ok_or(Error::NotFound("invoice"))
}

/// Lock plus the editability gate shared by every child mutation.
pub(super) async fn editable_invoice(
    conn: &mut AsyncPgConnection,
    invoice: Uuid,
) -> Result<Invoice, Error> {
    let current = lock_invoice(conn, invoice).await?;
    if !current.status.is_editable() {
        return Err(Error::NotEditable(current.status));
    }
    Ok(current)
}

/// The single source of truth for totals: re-reads all three child
/// collections, recomputes the subtotal, clamps the discount and writes the
/// total. Runs inside the caller's transaction, after the caller's mutation.
pub(super) async fn recompute_totals(
    conn: &mut AsyncPgConnection,
    invoice: Uuid,
) -> Result<Invoice, Error> {
    let billed: Vec<InvoiceLine> = {
        use crate::schema::invoice_lines::dsl::*;
        invoice_lines
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };
    let manual: Vec<InvoiceManualLine> = {
        use crate::schema::invoice_manual_lines::dsl::*;
        invoice_manual_lines
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };
    let fees: Vec<InvoiceFee> = {
        use crate::schema::invoice_fees::dsl::*;
        invoice_fees
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };

    use crate::schema::invoices::dsl::*;

    let current: Invoice = invoices.find(invoice).first(conn).await?;
    let new_subtotal = billing::subtotal(&billed, &manual, &fees);
    let new_discount = billing::clamp_discount(&new_subtotal, &current.discount);
    let new_total = &new_subtotal - &new_discount;

    Ok(diesel::update(invoices.find(invoice))
        .set((
            subtotal.eq(new_subtotal),
            discount.eq(new_discount),
            total.eq(new_total),
            updated_at.eq(diesel::dsl::now),
        ))
        .returning(invoices::all_columns())
        .get_result::<Invoice>(conn)
        .await?)
}

/// Reads an invoice with all of its child collections.
pub(super) async fn populate(
    conn: &mut AsyncPgConnection,
    invoice: Uuid,
) -> Result<PopulatedInvoice, Error> {
    let current: Invoice = {
        use crate::schema::invoices::dsl::*;
        invoices
            .find(invoice)
            .first(conn)
            .await
            .optional()?
            .ok_or(Error::NotFound("invoice"))?
    };

    let lines: Vec<InvoiceLine> = {
        use crate::schema::invoice_lines::dsl::*;
        invoice_lines
            .filter(invoice_id.eq(invoice))
            .order(employee_name.asc())
            .load(conn)
            .await?
    };
    let manual_lines: Vec<InvoiceManualLine> = {
        use crate::schema::invoice_manual_lines::dsl::*;
        invoice_manual_lines
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };
    let fees: Vec<InvoiceFee> = {
        use crate::schema::invoice_fees::dsl::*;
        invoice_fees
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };
    let attachments: Vec<FeeAttachment> = {
        use crate::schema::invoice_fee_attachments::dsl::*;
        invoice_fee_attachments
            .filter(fee_id.eq_any(fees.iter().map(|f| f.id).collect::<Vec<_>>()))
            .load(conn)
            .await?
    };
    let billed_entries: Vec<InvoiceTimeEntry> = {
        use crate::schema::invoice_time_entries::dsl::*;
        invoice_time_entries
            .filter(invoice_id.eq(invoice))
            .load(conn)
            .await?
    };

    let fees = fees
        .into_iter()
        .map(|fee| {
            let attachments = attachments
                .iter()
                .filter(|a| a.fee_id == fee.id)
                .cloned()
                .collect();
            PopulatedFee { fee, attachments }
        })
        .collect();

    Ok(PopulatedInvoice {
        id: current.id,
        project_id: current.project_id,
        status: current.status,
        subtotal: current.subtotal,
        discount: current.discount,
        total: current.total,
        notes: current.notes,
        invoice_number: current.invoice_number,
        issue_date: current.issue_date,
        due_date: current.due_date,
        created_at: current.created_at,
        updated_at: current.updated_at,
        lines,
        manual_lines,
        fees,
        billed_entries,
    })
}

impl DatabaseConnection {
    /// Creates an invoice for a project and pulls in every billable, normal
    /// time entry that has never been billed before: entries are grouped per
    /// employee, the current rate is snapshotted onto one line per group and
    /// the entries are linked so they can never be billed again. The whole
    /// pipeline is one transaction.
    pub async fn create_invoice(
        &mut self,
        request: CreateInvoice,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let project: Project = {
                        use crate::schema::projects::dsl::*;
                        projects
                            .find(request.project_id)
                            .first(conn)
                            .await
                            .optional()?
                            .ok_or(Error::NotFound("project"))?
                    };

                    let created: Invoice = {
                        use crate::schema::invoices::dsl::*;
                        diesel::insert_into(invoices)
                            .values(&NewInvoice {
                                project_id: project.id,
                                status: InvoiceStatus::Draft,
                                notes: request.notes,
                            })
                            .returning(invoices::all_columns())
                            .get_result(conn)
                            .await?
                    };

                    // Entries are eligible when billable and normal, and the
                    // dedupe is global: an id linked to any invoice of any
                    // project is out.
                    let candidates: Vec<TimeEntry> = {
                        use crate::schema::{invoice_time_entries, time_entries};
                        time_entries::table
                            .filter(time_entries::project_id.eq(project.id))
                            .filter(time_entries::billable.eq(true))
                            .filter(time_entries::status.eq(TimeEntryStatus::Normal))
                            .filter(time_entries::id.ne_all(
                                invoice_time_entries::table
                                    .select(invoice_time_entries::time_entry_id),
                            ))
                            .load(conn)
                            .await?
                    };

                    let groups = billing::group_by_employee(&candidates);

                    let mut lines = Vec::with_capacity(groups.len());
                    let mut links = Vec::with_capacity(candidates.len());
                    for group in &groups {
                        let resolved =
                            rates::resolve_rate(conn, group.employee_id, project.id).await?;
                        let employee: Option<Employee> = {
                            use crate::schema::employees::dsl::*;
                            employees
                                .find(group.employee_id)
                                .first(conn)
                                .await
                                .optional()?
                        };

                        lines.push(NewInvoiceLine {
                            invoice_id: created.id,
                            employee_id: group.employee_id,
                            employee_name: employee
                                .map(|e| e.name)
                                .unwrap_or_else(|| String::from("Unknown")),
                            role_name: resolved.role_name,
                            hours: group.hours.clone(),
                            rate_snapshot: resolved.rate.clone(),
                            amount: billing::line_amount(&group.hours, &resolved.rate),
                        });
                        links.extend(group.entry_ids.iter().map(|entry| NewInvoiceTimeEntry {
                            invoice_id: created.id,
                            time_entry_id: *entry,
                        }));
                    }

                    // An empty draft is a valid outcome, not an error.
                    if !lines.is_empty() {
                        {
                            use crate::schema::invoice_lines::dsl::*;
                            diesel::insert_into(invoice_lines)
                                .values(&lines)
                                .execute(conn)
                                .await?;
                        }
                        {
                            use crate::schema::invoice_time_entries::dsl::*;
                            diesel::insert_into(invoice_time_entries)
                                .values(&links)
                                .execute(conn)
                                .await
                                .map_err(link_conflict)?;
                        }
                    }

                    recompute_totals(conn, created.id).await?;
                    populate(conn, created.id).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn get_invoice(&mut self, invoice: Uuid) -> Result<PopulatedInvoice, Error> {
        populate(&mut self.0, invoice).await
    }

    pub async fn list_invoices(
        &mut self,
        filter: Option<InvoiceStatus>,
    ) -> Result<Vec<Invoice>, Error> {
        use crate::schema::invoices::dsl::*;

        let mut query = invoices.order(created_at.desc()).into_boxed();
        if let Some(wanted) = filter {
            query = query.filter(status.eq(wanted));
        }

        Ok(query.load(&mut self.0).await?)
    }

    /// Metadata edits (notes, discount, invoice number, dates). Gated on
    /// editability and always followed by a resum so a discount change lands
    /// in `total` immediately.
    pub async fn update_invoice(
        &mut self,
        invoice: Uuid,
        changes: InvoiceChanges,
    ) -> Result<Invoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    editable_invoice(conn, invoice).await?;

                    if changes.notes.is_some()
                        || changes.discount.is_some()
                        || changes.invoice_number.is_some()
                        || changes.issue_date.is_some()
                        || changes.due_date.is_some()
                    {
                        use crate::schema::invoices::dsl::*;
                        diesel::update(invoices.find(invoice))
                            .set(&changes)
                            .execute(conn)
                            .await?;
                    }

                    recompute_totals(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Validates the transition table and resums in the same operation, since
    /// mark-as-sent commonly follows the final edits.
    pub async fn transition_invoice(
        &mut self,
        invoice: Uuid,
        next: InvoiceStatus,
    ) -> Result<Invoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let current = lock_invoice(conn, invoice).await?;
                    if !current.status.can_transition(next) {
                        return Err(Error::InvalidTransition {
                            from: current.status,
                            to: next,
                        });
                    }

                    {
                        use crate::schema::invoices::dsl::*;
                        diesel::update(invoices.find(invoice))
                            .set((status.eq(next), updated_at.eq(diesel::dsl::now)))
                            .execute(conn)
                            .await?;
                    }

                    recompute_totals(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Rewrites a billed line's hours; the amount is always recomputed from
    /// the stored rate snapshot, never taken from the caller.
    pub async fn update_line_hours(
        &mut self,
        invoice: Uuid,
        line: Uuid,
        new_hours: BigDecimal,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    editable_invoice(conn, invoice).await?;

                    use crate::schema::invoice_lines::dsl::*;

                    let current: InvoiceLine = invoice_lines
                        .filter(id.eq(line).and(invoice_id.eq(invoice)))
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or(Error::NotFound("invoice line"))?;

                    let new_amount = billing::line_amount(&new_hours, &current.rate_snapshot);
                    diesel::update(invoice_lines.find(line))
                        .set((hours.eq(new_hours), amount.eq(new_amount)))
                        .execute(conn)
                        .await?;

                    recompute_totals(conn, invoice).await?;
                    populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Removes a billed line. The source time entries stay linked to the
    /// invoice, so the removed hours do not become billable again.
    pub async fn delete_line(
        &mut self,
        invoice: Uuid,
        line: Uuid,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    editable_invoice(conn, invoice).await?;

                    let deleted = {
                        use crate::schema::invoice_lines::dsl::*;
                        diesel::delete(
                            invoice_lines.filter(id.eq(line).and(invoice_id.eq(invoice))),
                        )
                        .execute(conn)
                        .await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("invoice line"));
                    }

                    recompute_totals(conn, invoice).await?;
                    populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Only drafts can be deleted. The junction rows go with the invoice,
    /// which releases the draft's time entries for a future invoice.
    pub async fn delete_invoice(&mut self, invoice: Uuid) -> Result<(), Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let current = lock_invoice(conn, invoice).await?;
                    if current.status != InvoiceStatus::Draft {
                        return Err(Error::NotEditable(current.status));
                    }

                    use crate::schema::invoices::dsl::*;
                    diesel::delete(invoices.find(invoice)).execute(conn).await?;

                    Ok(())
                }
                .scope_boxed()
            })
            .await
    }
}
