//! Printable invoices and receipts.
//!
//! Documents are rendered from the stored rows in one go; any lookup failure
//! aborts the request so no partial document is returned.

use crate::config::BusinessConfig;
use crate::database::DbPool;
use crate::domain::{Action, AuthUser, authorize};
use crate::entities::{
    customer_entity as customers, order_entity as orders, payment_entity as payments,
    staff_task_entity as staff_tasks,
};
use crate::error::{AppError, AppResult};
use crate::models::{DocumentKind, RenderedDocument};
use crate::services::order_service::{find_customer, find_order};
use crate::utils::{escape_html, format_money};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::fmt::Write;

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;color:#222;margin:40px}\
header{border-bottom:2px solid #333;margin-bottom:24px}\
table{width:100%;border-collapse:collapse;margin-top:16px}\
th,td{padding:8px;border-bottom:1px solid #ddd;text-align:left}\
td.amount,th.amount{text-align:right}\
.totals td{font-weight:bold}\
@media print{body{margin:0}}";

#[derive(Clone)]
pub struct DocumentService {
    pool: DbPool,
    business: BusinessConfig,
}

impl DocumentService {
    pub fn new(pool: DbPool, business: BusinessConfig) -> Self {
        Self { pool, business }
    }

    pub async fn render_invoice(
        &self,
        user: &AuthUser,
        order_id: i64,
    ) -> AppResult<RenderedDocument> {
        let order = find_order(self.pool.as_ref(), order_id).await?;
        let customer = find_customer(self.pool.as_ref(), order.customer_id).await?;
        authorize(user, Action::ViewDocument, Some(customer.user_id))?;

        let tasks = staff_tasks::Entity::find()
            .filter(staff_tasks::Column::OrderId.eq(order.id))
            .order_by_asc(staff_tasks::Column::Id)
            .all(self.pool.as_ref())
            .await?;
        let order_payments = payments::Entity::find()
            .filter(payments::Column::OrderId.eq(order.id))
            .order_by_asc(payments::Column::CreatedAt)
            .order_by_asc(payments::Column::Id)
            .all(self.pool.as_ref())
            .await?;

        let html = self.invoice_html(&order, &customer, &tasks, &order_payments)?;
        Ok(RenderedDocument {
            kind: DocumentKind::Invoice,
            reference: order.order_number,
            html,
        })
    }

    pub async fn render_receipt(
        &self,
        user: &AuthUser,
        payment_id: i64,
    ) -> AppResult<RenderedDocument> {
        let payment = payments::Entity::find_by_id(payment_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        let order = find_order(self.pool.as_ref(), payment.order_id).await?;
        let customer = find_customer(self.pool.as_ref(), order.customer_id).await?;
        authorize(user, Action::ViewDocument, Some(customer.user_id))?;

        let html = self.receipt_html(&payment, &order, &customer)?;
        Ok(RenderedDocument {
            kind: DocumentKind::Receipt,
            reference: payment.receipt_number(),
            html,
        })
    }

    fn money(&self, cents: i64) -> String {
        escape_html(&format_money(&self.business.currency_symbol, cents))
    }

    fn page_open(&self, out: &mut String, title: &str) -> std::fmt::Result {
        let b = &self.business;
        write!(
            out,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<header>\n\
             <h1>{name}</h1>\n",
            title = escape_html(title),
            name = escape_html(&b.name),
        )?;
        if !b.address.is_empty() {
            writeln!(out, "<p>{}</p>", escape_html(&b.address))?;
        }
        if !b.phone.is_empty() {
            writeln!(out, "<p>Tel: {}</p>", escape_html(&b.phone))?;
        }
        out.push_str("</header>\n");
        Ok(())
    }

    fn customer_block(out: &mut String, customer: &customers::Model) -> std::fmt::Result {
        writeln!(out, "<section class=\"customer\">\n<h3>Bill to</h3>")?;
        writeln!(out, "<p>{}</p>", escape_html(&customer.full_name))?;
        for line in [&customer.address, &customer.email, &customer.phone]
            .into_iter()
            .flatten()
        {
            writeln!(out, "<p>{}</p>", escape_html(line))?;
        }
        out.push_str("</section>\n");
        Ok(())
    }

    fn invoice_html(
        &self,
        order: &orders::Model,
        customer: &customers::Model,
        tasks: &[staff_tasks::Model],
        order_payments: &[payments::Model],
    ) -> AppResult<String> {
        let mut out = String::with_capacity(4096);
        self.write_invoice(&mut out, order, customer, tasks, order_payments)
            .map_err(|e| AppError::InternalError(format!("failed to render invoice: {e}")))?;
        Ok(out)
    }

    fn write_invoice(
        &self,
        out: &mut String,
        order: &orders::Model,
        customer: &customers::Model,
        tasks: &[staff_tasks::Model],
        order_payments: &[payments::Model],
    ) -> std::fmt::Result {
        let number = escape_html(&order.order_number);
        self.page_open(out, &format!("Invoice {}", order.order_number))?;

        writeln!(out, "<h2>Invoice {number}</h2>")?;
        writeln!(out, "<p>Date: {}</p>", format_date(order.created_at))?;
        if let Some(due) = order.due_date {
            writeln!(out, "<p>Due: {}</p>", due.format("%Y-%m-%d"))?;
        }
        writeln!(out, "<p>Status: {}</p>", order.status)?;
        Self::customer_block(out, customer)?;

        out.push_str("<table class=\"items\">\n<thead><tr><th>Item</th><th>Status</th></tr></thead>\n<tbody>\n");
        if let Some(description) = &order.description {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(description),
                order.status
            )?;
        }
        for task in tasks {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td></tr>",
                escape_html(&task.title),
                task.status
            )?;
        }
        out.push_str("</tbody>\n</table>\n");

        if !order_payments.is_empty() {
            out.push_str("<h3>Payments</h3>\n<table class=\"payments\">\n<thead><tr><th>Receipt</th><th>Date</th><th>Method</th><th class=\"amount\">Amount</th></tr></thead>\n<tbody>\n");
            for p in order_payments {
                writeln!(
                    out,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td class=\"amount\">{}</td></tr>",
                    escape_html(&p.receipt_number()),
                    format_date(p.created_at),
                    p.payment_method.label(),
                    self.money(p.amount)
                )?;
            }
            out.push_str("</tbody>\n</table>\n");
        }

        writeln!(
            out,
            "<table class=\"totals\">\n\
             <tr><td>Total</td><td class=\"amount\">{}</td></tr>\n\
             <tr><td>Paid</td><td class=\"amount\">{}</td></tr>\n\
             <tr><td>Balance due</td><td class=\"amount\">{}</td></tr>\n\
             </table>",
            self.money(order.total_amount),
            self.money(order.amount_paid()),
            self.money(order.remaining_amount)
        )?;
        if order.is_fully_paid() {
            out.push_str("<p class=\"paid\">PAID IN FULL</p>\n");
        }
        out.push_str("</body>\n</html>\n");
        Ok(())
    }

    fn receipt_html(
        &self,
        payment: &payments::Model,
        order: &orders::Model,
        customer: &customers::Model,
    ) -> AppResult<String> {
        let mut out = String::with_capacity(2048);
        self.write_receipt(&mut out, payment, order, customer)
            .map_err(|e| AppError::InternalError(format!("failed to render receipt: {e}")))?;
        Ok(out)
    }

    fn write_receipt(
        &self,
        out: &mut String,
        payment: &payments::Model,
        order: &orders::Model,
        customer: &customers::Model,
    ) -> std::fmt::Result {
        let receipt_number = payment.receipt_number();
        self.page_open(out, &format!("Receipt {receipt_number}"))?;

        writeln!(out, "<h2>Payment receipt {}</h2>", escape_html(&receipt_number))?;
        writeln!(out, "<p>Date: {}</p>", format_date(payment.created_at))?;
        Self::customer_block(out, customer)?;

        writeln!(
            out,
            "<table>\n\
             <tr><th>Order</th><td>{}</td></tr>\n\
             <tr><th>Payment method</th><td>{}</td></tr>",
            escape_html(&order.order_number),
            payment.payment_method.label()
        )?;
        if let Some(tx) = &payment.transaction_id {
            writeln!(out, "<tr><th>Transaction</th><td>{}</td></tr>", escape_html(tx))?;
        }
        if let Some(notes) = &payment.notes {
            writeln!(out, "<tr><th>Notes</th><td>{}</td></tr>", escape_html(notes))?;
        }
        writeln!(
            out,
            "<tr class=\"totals\"><th>Amount paid</th><td class=\"amount\">{}</td></tr>\n\
             <tr><th>Order total</th><td class=\"amount\">{}</td></tr>\n\
             <tr><th>Balance remaining</th><td class=\"amount\">{}</td></tr>\n\
             </table>",
            self.money(payment.amount),
            self.money(order.total_amount),
            self.money(order.remaining_amount)
        )?;
        out.push_str("<p>Thank you for your business.</p>\n</body>\n</html>\n");
        Ok(())
    }
}

fn format_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{OrderStatus, PaymentMethod, TaskStatus, UserRole};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn business() -> BusinessConfig {
        BusinessConfig {
            name: "Needle & Thread".to_string(),
            address: "1 High St".to_string(),
            phone: String::new(),
            currency_symbol: "$".to_string(),
        }
    }

    fn order() -> orders::Model {
        orders::Model {
            id: 10,
            order_number: "ORD-0010".to_string(),
            customer_id: 3,
            description: Some("Wedding <dress>".to_string()),
            status: OrderStatus::InProgress,
            total_amount: 150_000,
            remaining_amount: 50_000,
            due_date: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn customer() -> customers::Model {
        customers::Model {
            id: 3,
            user_id: 30,
            full_name: "O'Brien".to_string(),
            email: Some("ob@example.com".to_string()),
            phone: None,
            address: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn payment() -> payments::Model {
        payments::Model {
            id: 5,
            order_id: 10,
            amount: 100_000,
            payment_method: PaymentMethod::BankTransfer,
            transaction_id: Some("TX<1>".to_string()),
            notes: None,
            recorded_by: 1,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_invoice_escapes_and_totals() {
        let task = staff_tasks::Model {
            id: 1,
            order_id: 10,
            staff_id: 2,
            title: "Cut & sew".to_string(),
            status: TaskStatus::Completed,
            notes: None,
            started_at: None,
            completed_at: None,
            created_at: None,
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![order()]])
            .append_query_results([vec![customer()]])
            .append_query_results([vec![task]])
            .append_query_results([vec![payment()]])
            .into_connection();
        let service = DocumentService::new(Arc::new(db), business());

        let doc = service
            .render_invoice(&AuthUser::new(30, UserRole::Customer), 10)
            .await
            .unwrap();
        assert_eq!(doc.file_name(), "invoice-ORD-0010.html");
        assert!(doc.html.contains("Needle &amp; Thread"));
        assert!(doc.html.contains("Wedding &lt;dress&gt;"));
        assert!(doc.html.contains("O&#39;Brien"));
        assert!(doc.html.contains("Cut &amp; sew"));
        assert!(doc.html.contains("$1,500.00"));
        assert!(doc.html.contains("$500.00"));
        assert!(!doc.html.contains("PAID IN FULL"));
    }

    #[tokio::test]
    async fn test_receipt_for_other_customer_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![payment()]])
            .append_query_results([vec![order()]])
            .append_query_results([vec![customer()]])
            .into_connection();
        let service = DocumentService::new(Arc::new(db), business());

        let err = service
            .render_receipt(&AuthUser::new(31, UserRole::Customer), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_receipt_renders_for_staff() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![payment()]])
            .append_query_results([vec![order()]])
            .append_query_results([vec![customer()]])
            .into_connection();
        let service = DocumentService::new(Arc::new(db), business());

        let doc = service
            .render_receipt(&AuthUser::new(2, UserRole::Staff), 5)
            .await
            .unwrap();
        assert_eq!(doc.file_name(), "receipt-RCPT-00000000-000005.html");
        assert!(doc.html.contains("Bank Transfer"));
        assert!(doc.html.contains("TX&lt;1&gt;"));
        assert!(doc.html.contains("$1,000.00"));
    }
}
