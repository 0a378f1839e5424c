use super::{invoices, DatabaseConnection};
use crate::api::extras::{
    CreateFee, CreateFeeAttachment, CreateManualLine, UpdateFee, UpdateManualLine,
};
use crate::api::invoices::PopulatedInvoice;
use crate::billing;
use crate::error::Error;
use crate::models::*;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

async fn fee_by_id(conn: &mut AsyncPgConnection, fee: Uuid) -> Result<InvoiceFee, Error> {
    use crate::schema::invoice_fees::dsl::*;

    invoice_fees
        .find(fee)
        .first(conn)
        .await
        .optional()?
        .ok_or(Error::NotFound("fee"))
}

/// Manual people lines and flat fees: independent of time entries, gated by
/// the invoice's editability, and every mutation ends in a resum. Totals are
/// always recomputed here from hours x rate / quantity x unit price; the
/// caller never supplies one.
impl DatabaseConnection {
    pub async fn create_manual_line(
        &mut self,
        invoice: Uuid,
        request: CreateManualLine,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    {
                        use crate::schema::invoice_manual_lines::dsl::*;
                        diesel::insert_into(invoice_manual_lines)
                            .values(&NewInvoiceManualLine {
                                invoice_id: invoice,
                                person_name: request.person_name,
                                line_total: billing::line_amount(
                                    &request.hours,
                                    &request.rate_usd,
                                ),
                                hours: request.hours,
                                rate_usd: request.rate_usd,
                                description: request.description,
                            })
                            .execute(conn)
                            .await?;
                    }

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn update_manual_line(
        &mut self,
        invoice: Uuid,
        line: Uuid,
        request: UpdateManualLine,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    use crate::schema::invoice_manual_lines::dsl::*;

                    let current: InvoiceManualLine = invoice_manual_lines
                        .filter(id.eq(line).and(invoice_id.eq(invoice)))
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or(Error::NotFound("manual line"))?;

                    let new_hours = request.hours.unwrap_or(current.hours);
                    let new_rate = request.rate_usd.unwrap_or(current.rate_usd);

                    diesel::update(invoice_manual_lines.find(line))
                        .set((
                            person_name.eq(request.person_name.unwrap_or(current.person_name)),
                            description
                                .eq(request.description.or(current.description)),
                            line_total.eq(billing::line_amount(&new_hours, &new_rate)),
                            hours.eq(new_hours),
                            rate_usd.eq(new_rate),
                        ))
                        .execute(conn)
                        .await?;

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn delete_manual_line(
        &mut self,
        invoice: Uuid,
        line: Uuid,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    let deleted = {
                        use crate::schema::invoice_manual_lines::dsl::*;
                        diesel::delete(
                            invoice_manual_lines.filter(id.eq(line).and(invoice_id.eq(invoice))),
                        )
                        .execute(conn)
                        .await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("manual line"));
                    }

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn create_fee(
        &mut self,
        invoice: Uuid,
        request: CreateFee,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    {
                        use crate::schema::invoice_fees::dsl::*;
                        diesel::insert_into(invoice_fees)
                            .values(&NewInvoiceFee {
                                invoice_id: invoice,
                                label: request.label,
                                fee_total: billing::line_amount(
                                    &request.quantity,
                                    &request.unit_price_usd,
                                ),
                                quantity: request.quantity,
                                unit_price_usd: request.unit_price_usd,
                                description: request.description,
                            })
                            .execute(conn)
                            .await?;
                    }

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn update_fee(
        &mut self,
        invoice: Uuid,
        fee: Uuid,
        request: UpdateFee,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    use crate::schema::invoice_fees::dsl::*;

                    let current: InvoiceFee = invoice_fees
                        .filter(id.eq(fee).and(invoice_id.eq(invoice)))
                        .first(conn)
                        .await
                        .optional()?
                        .ok_or(Error::NotFound("fee"))?;

                    let new_quantity = request.quantity.unwrap_or(current.quantity);
                    let new_unit_price = request.unit_price_usd.unwrap_or(current.unit_price_usd);

                    diesel::update(invoice_fees.find(fee))
                        .set((
                            label.eq(request.label.unwrap_or(current.label)),
                            description.eq(request.description.or(current.description)),
                            fee_total
                                .eq(billing::line_amount(&new_quantity, &new_unit_price)),
                            quantity.eq(new_quantity),
                            unit_price_usd.eq(new_unit_price),
                        ))
                        .execute(conn)
                        .await?;

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn delete_fee(
        &mut self,
        invoice: Uuid,
        fee: Uuid,
    ) -> Result<PopulatedInvoice, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    invoices::editable_invoice(conn, invoice).await?;

                    // Attachment records go with the fee via cascade; the
                    // blobs themselves live in external storage.
                    let deleted = {
                        use crate::schema::invoice_fees::dsl::*;
                        diesel::delete(
                            invoice_fees.filter(id.eq(fee).and(invoice_id.eq(invoice))),
                        )
                        .execute(conn)
                        .await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("fee"));
                    }

                    invoices::recompute_totals(conn, invoice).await?;
                    invoices::populate(conn, invoice).await
                }
                .scope_boxed()
            })
            .await
    }

    /// Attachments are documentary; they never influence totals, so there is
    /// no resum here, only the editability gate of the owning invoice.
    pub async fn add_fee_attachment(
        &mut self,
        fee: Uuid,
        request: CreateFeeAttachment,
    ) -> Result<FeeAttachment, Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let owner = fee_by_id(conn, fee).await?;
                    invoices::editable_invoice(conn, owner.invoice_id).await?;

                    use crate::schema::invoice_fee_attachments::dsl::*;

                    Ok(diesel::insert_into(invoice_fee_attachments)
                        .values(&NewFeeAttachment {
                            fee_id: fee,
                            file_name: request.file_name,
                            file_url: request.file_url,
                            file_size: request.file_size,
                        })
                        .returning(invoice_fee_attachments::all_columns())
                        .get_result(conn)
                        .await?)
                }
                .scope_boxed()
            })
            .await
    }

    pub async fn delete_fee_attachment(
        &mut self,
        fee: Uuid,
        attachment: Uuid,
    ) -> Result<(), Error> {
        self.0
            .transaction::<_, Error, _>(|conn| {
                async move {
                    let owner = fee_by_id(conn, fee).await?;
                    invoices::editable_invoice(conn, owner.invoice_id).await?;

                    let deleted = {
                        use crate::schema::invoice_fee_attachments::dsl::*;
                        diesel::delete(
                            invoice_fee_attachments
                                .filter(id.eq(attachment).and(fee_id.eq(fee))),
                        )
                        .execute(conn)
                        .await?
                    };
                    if deleted == 0 {
                        return Err(Error::NotFound("attachment"));
                    }

                    Ok(())
                }
                .scope_boxed()
            })
            .await
    }
}
