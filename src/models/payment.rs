use crate::entities::{PaymentMethod, payment_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub order_id: i64,
    /// cents, must be positive and not exceed the remaining balance
    #[schema(example = 5000)]
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordPaymentResponse {
    pub payment_id: i64,
    pub remaining_amount: i64,
    pub is_fully_paid: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub order_id: i64,
    pub amount: i64,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub receipt_number: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<payment_entity::Model> for PaymentResponse {
    fn from(m: payment_entity::Model) -> Self {
        Self {
            receipt_number: m.receipt_number(),
            id: m.id,
            order_id: m.order_id,
            amount: m.amount,
            payment_method: m.payment_method,
            transaction_id: m.transaction_id,
            notes: m.notes,
            created_at: m.created_at,
        }
    }
}
