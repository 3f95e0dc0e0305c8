use serde::{Deserialize, Deserializer};
use crate::domain::models::payment::PaymentIntent;
use crate::domain::services::{
    admission::{BookingRequest, CustomerInput},
    catalog::{BusinessHourInput, NewServiceInput, ServicePatch},
    payments::PixChargeInput,
};

#[derive(Deserialize)]
pub struct CustomerDto {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub service_id: String,
    pub start_at: String,
    pub customer: CustomerDto,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(r: CreateBookingRequest) -> Self {
        BookingRequest {
            service_id: r.service_id,
            start_at: r.start_at,
            customer: CustomerInput {
                name: r.customer.name,
                phone: r.customer.phone,
                email: r.customer.email,
            },
        }
    }
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub service_id: Option<String>,
    pub date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub signal_percent_override: Option<i32>,
    pub active: Option<bool>,
}

impl From<CreateServiceRequest> for NewServiceInput {
    fn from(r: CreateServiceRequest) -> Self {
        NewServiceInput {
            name: r.name,
            duration_minutes: r.duration_minutes,
            price_cents: r.price_cents,
            signal_percent_override: r.signal_percent_override,
            active: r.active,
        }
    }
}

/// Absent keeps the stored value, `null` clears it.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub duration_minutes: Option<i32>,
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub signal_percent_override: Option<Option<i32>>,
    pub active: Option<bool>,
}

impl From<UpdateServiceRequest> for ServicePatch {
    fn from(r: UpdateServiceRequest) -> Self {
        ServicePatch {
            name: r.name,
            duration_minutes: r.duration_minutes,
            price_cents: r.price_cents,
            signal_percent_override: r.signal_percent_override,
            active: r.active,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHourItem {
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct SetBusinessHoursRequest {
    pub items: Vec<BusinessHourItem>,
}

impl SetBusinessHoursRequest {
    pub fn into_inputs(self) -> Vec<BusinessHourInput> {
        self.items.into_iter()
            .map(|i| BusinessHourInput {
                weekday: i.weekday,
                start_time: i.start_time,
                end_time: i.end_time,
                active: i.active,
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlockRequest {
    pub start_at: String,
    pub end_at: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixRequest {
    #[serde(default)]
    pub booking_id: String,
    pub payer_email: Option<String>,
    #[serde(default)]
    pub intent: PaymentIntent,
}

impl From<CreatePixRequest> for PixChargeInput {
    fn from(r: CreatePixRequest) -> Self {
        PixChargeInput {
            booking_id: r.booking_id,
            payer_email: r.payer_email,
            intent: r.intent,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub service_id: Option<String>,
}
