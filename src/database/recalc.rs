use super::{invoices, rates, DatabaseConnection};
use crate::api::invoices::PopulatedInvoice;
use crate::billing;
use crate::error::Error;
use crate::models::{Invoice, InvoiceLine, InvoiceStatus};

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcScope {
    /// Every unpaid (draft or sent) invoice of the project.
    All,
    /// Only the most recently created unpaid invoice.
    Latest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecalcSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Re-resolves each line's rate against the current assignment and role data
/// and rewrites snapshot, amount and role name. Hours are never touched, so
/// running this twice without a rate change is a no-op.
async fn recalculate_lines(
    conn: &mut AsyncPgConnection,
    invoice: &Invoice,
) -> Result<(), Error> {
    use crate::schema::invoice_lines::dsl::*;

    let lines: Vec<InvoiceLine> = invoice_lines
        .filter(invoice_id.eq(invoice.id))
        .load(conn)
        .await?;

    for line in lines {
        let resolved = rates::resolve_rate(conn, line.employee_id, invoice.project_id).await?;
        let new_amount = billing::line_amount(&line.hours, &resolved.rate);

        diesel::update(invoice_lines.find(line.id))
            .set((
                rate_snapshot.eq(resolved.rate),
                amount.eq(new_amount),
                role_name.eq(resolved.role_name),
            ))
            .execute(conn)
            .await?;
    }

    Ok(())
}

impl DatabaseConnection {
    /// Re-derives every line of one invoice from the live rates, then resums.
    pub async fn recalculate_invoice(&mut self, invoice: Uuid) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let current = invoices::editable_invoice(conn, invoice).await?;
                    recalculate_lines(conn, &current).await?;
                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Bulk variant over a project's unpaid invoices. Every invoice is its
    /// own transaction: a failure is logged and counted, and the batch keeps
    /// going, so interrupting the loop never corrupts an already-committed
    /// invoice.
    pub async fn recalculate_project(
        &mut self,
        project: Uuid,
        scope: RecalcScope,
    ) -> Result<RecalcSummary, Error> {
        {
            use crate::schema::projects::dsl::*;
            projects
                .find(project)
                .first::<crate::models::Project>(&mut self.0)
                .await
                .optional()?
                .ok_or(Error::NotFound("project"))?;
        }

        let candidates: Vec<Uuid> = {
            use crate::schema::invoices::dsl::*;
            invoices
                .filter(project_id.eq(project))
                .filter(status.eq_any(vec![InvoiceStatus::Draft, InvoiceStatus::Sent]))
                .order(created_at.desc())
                .select(id)
                .load(&mut self.0)
                .await?
        };
        let candidates: Vec<Uuid> = match scope {
            RecalcScope::Latest => candidates.into_iter().take(1).collect(),
            RecalcScope::All => candidates,
        };

        let mut summary = RecalcSummary {
            processed: 0,
            failed: 0,
        };
        for invoice in candidates {
            let result = self
                .0
                .transaction::<_, Error, _>(|conn| {
                    async move {
                        let current = invoices::lock_invoice(conn, invoice).await?;
                        recalculate_lines(conn, &current).await?;
                        invoices::recompute_totals(conn, invoice).await?;
                        Ok(())
                    }
                    .scope_boxed()
                })
                .await;

            match result {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    warn!("Recalculation of invoice {invoice} failed: {e}");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
