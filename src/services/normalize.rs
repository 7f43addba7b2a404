// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maps upstream order JSON of any known schema version onto [`OrderRecord`].
//!
//! Every field is an ordered chain of extractors; the first one producing a
//! non-default value wins. An order with an unexpected shape degrades to
//! default field values, it never fails the run.

use crate::models::order::{OrderRecord, DEFAULT_CURRENCY};
use serde_json::{Map, Value};

/// Extracts one candidate value from a raw order.
type Extractor<T> = fn(&Map<String, Value>) -> Option<T>;

/// A monetary source field and whether it is stated in minor units.
struct AmountField {
    key: &'static str,
    minor_units: bool,
}

const ID_CHAIN: &[Extractor<String>] = &[
    |o| text_at(o, &["guid"]),
    |o| text_at(o, &["id"]),
    |o| text_at(o, &["_id"]),
];

const CREATED_AT_CHAIN: &[Extractor<String>] = &[
    |o| text_at(o, &["created_at"]),
    |o| text_at(o, &["created"]),
    |o| text_at(o, &["@timestamp"]),
];

const EVENT_NAME_CHAIN: &[Extractor<String>] = &[
    first_event_name,
    |o| text_at(o, &["event", "name"]),
    |o| text_at(o, &["event_name"]),
    |o| text_at(o, &["event", "title"]),
];

const CURRENCY_CHAIN: &[Extractor<String>] = &[
    |o| text_at(o, &["currency"]),
    |o| text_at(o, &["total", "currency"]),
];

const ORDER_AMOUNTS: &[AmountField] = &[
    AmountField {
        key: "finn_price",
        minor_units: true,
    },
    AmountField {
        key: "finn_value",
        minor_units: true,
    },
    AmountField {
        key: "amount",
        minor_units: false,
    },
    AmountField {
        key: "revenue",
        minor_units: false,
    },
];

const PAYMENT_AMOUNTS: &[AmountField] = &[
    AmountField {
        key: "finn_price",
        minor_units: true,
    },
    AmountField {
        key: "amount",
        minor_units: false,
    },
];

/// Normalize one raw order. Non-object input yields an all-default record.
pub fn normalize(raw: &Value) -> OrderRecord {
    let Some(order) = raw.as_object() else {
        tracing::debug!("Order is not a JSON object, using defaults");
        return OrderRecord::default();
    };

    OrderRecord {
        order_id: first_of(ID_CHAIN, order).unwrap_or_default(),
        created_at: first_of(CREATED_AT_CHAIN, order).unwrap_or_default(),
        event_name: first_of(EVENT_NAME_CHAIN, order).unwrap_or_default(),
        currency: first_of(CURRENCY_CHAIN, order)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        total: order_total(order),
    }
}

/// Normalize a batch, preserving order.
pub fn normalize_all(raw: &[Value]) -> Vec<OrderRecord> {
    raw.iter().map(normalize).collect()
}

fn first_of<T>(chain: &[Extractor<T>], order: &Map<String, Value>) -> Option<T> {
    chain.iter().find_map(|extract| extract(order))
}

/// Total in major units: order-level fields first, then the first payment.
fn order_total(order: &Map<String, Value>) -> f64 {
    if let Some(total) = first_amount(order, ORDER_AMOUNTS) {
        return total;
    }

    order
        .get("payments")
        .and_then(Value::as_array)
        .and_then(|payments| payments.first())
        .and_then(Value::as_object)
        .and_then(|payment| first_amount(payment, PAYMENT_AMOUNTS))
        .unwrap_or(0.0)
}

/// First field in `fields` that yields a non-zero amount.
fn first_amount(object: &Map<String, Value>, fields: &[AmountField]) -> Option<f64> {
    fields.iter().find_map(|field| {
        let value = coerce_amount(object.get(field.key)?);
        let value = if field.minor_units { value / 100.0 } else { value };
        (value != 0.0).then_some(value)
    })
}

/// Numbers and numeric strings; anything else, negative or non-finite is 0.0.
fn coerce_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// First value of the `events` mapping (event id -> name), in upstream order.
fn first_event_name(order: &Map<String, Value>) -> Option<String> {
    order
        .get("events")?
        .as_object()?
        .values()
        .next()
        .and_then(scalar_text)
}

/// Non-empty text at a nested path. Numbers render as decimal text.
fn text_at(object: &Map<String, Value>, path: &[&str]) -> Option<String> {
    let (first, rest) = path.split_first()?;
    let mut current = object.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    scalar_text(current)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_finn_price_is_in_cents() {
        let record = normalize(&json!({"finn_price": 1050}));
        assert_eq!(record.total, 10.50);
    }

    #[test]
    fn test_amount_is_in_major_units() {
        let record = normalize(&json!({"amount": 5}));
        assert_eq!(record.total, 5.0);
    }

    #[test]
    fn test_empty_order_gets_defaults() {
        let record = normalize(&json!({}));
        assert_eq!(record.total, 0.0);
        assert_eq!(record.order_id, "");
        assert_eq!(record.created_at, "");
        assert_eq!(record.event_name, "");
        assert_eq!(record.currency, "EUR");
    }

    #[test]
    fn test_id_priority() {
        let record = normalize(&json!({"_id": "c", "id": 42, "guid": "a"}));
        assert_eq!(record.order_id, "a");

        let record = normalize(&json!({"_id": "c", "id": 42}));
        assert_eq!(record.order_id, "42");

        let record = normalize(&json!({"_id": "c"}));
        assert_eq!(record.order_id, "c");
    }

    #[test]
    fn test_created_at_passes_through_unparsed() {
        let record = normalize(&json!({"@timestamp": "yesterday-ish"}));
        assert_eq!(record.created_at, "yesterday-ish");

        let record = normalize(&json!({"created": "b", "created_at": "a"}));
        assert_eq!(record.created_at, "a");
    }

    #[test]
    fn test_event_name_takes_first_mapping_entry_in_upstream_order() {
        let raw: Value =
            serde_json::from_str(r#"{"events": {"zz-id": "Zomerfeest", "aa-id": "Afterparty"}}"#)
                .unwrap();
        assert_eq!(normalize(&raw).event_name, "Zomerfeest");
    }

    #[test]
    fn test_event_name_fallbacks() {
        let record = normalize(&json!({"event": {"name": "Nested"}, "event_name": "Flat"}));
        assert_eq!(record.event_name, "Nested");

        let record = normalize(&json!({"event_name": "Flat", "event": {"title": "Title"}}));
        assert_eq!(record.event_name, "Flat");

        let record = normalize(&json!({"event": {"title": "Title"}}));
        assert_eq!(record.event_name, "Title");

        let record = normalize(&json!({"events": {}, "event_name": "Flat"}));
        assert_eq!(record.event_name, "Flat");
    }

    #[test]
    fn test_currency_fallbacks() {
        let record = normalize(&json!({"currency": "USD", "total": {"currency": "GBP"}}));
        assert_eq!(record.currency, "USD");

        let record = normalize(&json!({"total": {"currency": "GBP"}}));
        assert_eq!(record.currency, "GBP");
    }

    #[test]
    fn test_zero_primary_falls_back_to_payment() {
        let record = normalize(&json!({
            "finn_price": 0,
            "payments": [{"finn_price": 2500}, {"finn_price": 9900}]
        }));
        assert_eq!(record.total, 25.0);

        let record = normalize(&json!({"payments": [{"amount": "7.25"}]}));
        assert_eq!(record.total, 7.25);
    }

    #[test]
    fn test_later_primary_field_used_when_earlier_is_zero() {
        let record = normalize(&json!({"finn_price": 0, "finn_value": 990}));
        assert_eq!(record.total, 9.9);
    }

    #[test]
    fn test_non_numeric_amount_coerces_to_zero() {
        let record = normalize(&json!({"finn_price": "n/a", "guid": "x"}));
        assert_eq!(record.total, 0.0);
        assert_eq!(record.order_id, "x");

        let record = normalize(&json!({"amount": {"value": 3}}));
        assert_eq!(record.total, 0.0);
    }

    #[test]
    fn test_negative_amount_never_leaks_into_total() {
        let record = normalize(&json!({"amount": -12.5}));
        assert_eq!(record.total, 0.0);
    }

    #[test]
    fn test_non_object_order_degrades_to_defaults() {
        assert_eq!(normalize(&json!("garbage")), OrderRecord::default());
        assert_eq!(normalize(&Value::Null), OrderRecord::default());
    }
}
