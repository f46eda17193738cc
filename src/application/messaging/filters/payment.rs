//! Shipping and pre-checkout query filters

use std::sync::Arc;

use crate::domain::entities::{PreCheckoutQuery, ShippingQuery};
use super::Filter;

pub fn shipping_payload(payload: impl Into<String>) -> Filter<ShippingQuery> {
    let payload = payload.into();
    Arc::new(move |q: &ShippingQuery| q.invoice_payload == payload)
}

pub fn shipping_country(country_code: impl Into<String>) -> Filter<ShippingQuery> {
    let code = country_code.into().to_uppercase();
    Arc::new(move |q: &ShippingQuery| q.shipping_address.country_code.to_uppercase() == code)
}

pub fn checkout_payload(payload: impl Into<String>) -> Filter<PreCheckoutQuery> {
    let payload = payload.into();
    Arc::new(move |q: &PreCheckoutQuery| q.invoice_payload == payload)
}

pub fn checkout_payload_prefix(prefix: impl Into<String>) -> Filter<PreCheckoutQuery> {
    let prefix = prefix.into();
    Arc::new(move |q: &PreCheckoutQuery| q.invoice_payload.starts_with(&prefix))
}

pub fn currency(code: impl Into<String>) -> Filter<PreCheckoutQuery> {
    let code = code.into().to_uppercase();
    Arc::new(move |q: &PreCheckoutQuery| q.currency.to_uppercase() == code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;

    #[test]
    fn test_checkout_matchers() {
        let q = PreCheckoutQuery {
            id: "pc".to_string(),
            from: User::new(1),
            currency: "usd".to_string(),
            total_amount: 500,
            invoice_payload: "order-17".to_string(),
        };
        assert!(checkout_payload("order-17")(&q));
        assert!(checkout_payload_prefix("order-")(&q));
        assert!(currency("USD")(&q));
        assert!(!currency("EUR")(&q));
    }
}
