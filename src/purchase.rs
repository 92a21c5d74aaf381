//! Purchase body coercion and transaction-payload mapping.
//!
//! The browser posts loosely-typed JSON (numbers may arrive as strings, the
//! 3DS result is whatever the widget produced), so coercion is deliberately
//! lenient and the payload builder works on raw `serde_json::Value`s.

use serde_json::{Map, Value};

use crate::error::DemoError;

/// Fixed recurring period the demo sends with every charge.
const INITIAL_PERIOD: u32 = 30;

/// Coerce a JSON number or numeric string to a 2-decimal amount.
pub fn to_amount2(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some((n * 100.0).round() / 100.0)
}

/// Coerce a JSON number or numeric string to an integer (truncating).
pub fn to_int(v: &Value) -> Option<i64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.trunc() as i64)
}

/// Validated /purchase fields after coercion.
pub struct PurchaseFields {
    pub payment_token_id: String,
    pub amount: f64,
    pub currency_code: i64,
    pub client_accnum: i64,
    pub client_subacc: i64,
    /// 3DS authentication result as produced by the widget, if any.
    pub threeds: Option<Map<String, Value>>,
}

/// Extract and coerce the required fields from a /purchase body.
pub fn extract_fields(body: &Value) -> Result<PurchaseFields, DemoError> {
    let obj = body.as_object().ok_or(DemoError::MissingFields)?;

    let payment_token_id = match obj.get("paymentTokenId") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(DemoError::MissingFields),
    };

    let amount = obj
        .get("amount")
        .and_then(to_amount2)
        .ok_or(DemoError::MissingFields)?;
    let currency_code = obj
        .get("currencyCode")
        .and_then(to_int)
        .ok_or(DemoError::MissingFields)?;
    let client_accnum = obj
        .get("clientAccnum")
        .and_then(to_int)
        .ok_or(DemoError::MissingFields)?;
    let client_subacc = obj
        .get("clientSubacc")
        .and_then(to_int)
        .ok_or(DemoError::MissingFields)?;

    // Only a JSON object counts as 3DS information; anything else is ignored.
    let threeds = obj
        .get("threedsInformation")
        .and_then(|v| v.as_object())
        .cloned();

    Ok(PurchaseFields {
        payment_token_id,
        amount,
        currency_code,
        client_accnum,
        client_subacc,
        threeds,
    })
}

/// JavaScript-style truthiness, matching how the original demo read the
/// widget's `success` flags.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First present, non-null field rendered as a string. A present empty
/// string is still `Some("")` — only absent/null fields yield `None`, so
/// callers can default the way the widget's null-coalescing reads did.
fn str_field_opt(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match obj.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Bool(b)) => return Some(b.to_string()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(other) => return Some(other.to_string()),
        }
    }
    None
}

/// First present, non-null field rendered as a string ("" when absent).
fn str_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    str_field_opt(obj, keys).unwrap_or_default()
}

fn insert_if_nonempty(payload: &mut Map<String, Value>, key: &str, value: String) {
    if !value.is_empty() {
        payload.insert(key.to_string(), Value::String(value));
    }
}

/// Transaction request ready to send to the gateway.
pub struct PreparedPurchase {
    pub payload: Value,
    /// true when the threeds variant of the payment-token endpoint applies
    pub threeds_endpoint: bool,
}

/// Build the gateway payload from coerced fields.
///
/// Without 3DS information this is the plain payment-token charge. With it,
/// the payload carries either the verified `threeds*` block or the
/// authentication-failure block, keyed on the widget's status/success flags.
pub fn build_payload(fields: &PurchaseFields) -> PreparedPurchase {
    let mut payload = Map::new();
    payload.insert("clientAccnum".into(), fields.client_accnum.into());
    payload.insert("clientSubacc".into(), fields.client_subacc.into());
    payload.insert("initialPrice".into(), serde_json::json!(fields.amount));
    payload.insert("initialPeriod".into(), INITIAL_PERIOD.into());
    payload.insert("currencyCode".into(), fields.currency_code.into());

    let threeds = match &fields.threeds {
        Some(t) => t,
        None => {
            return PreparedPurchase {
                payload: Value::Object(payload),
                threeds_endpoint: false,
            }
        }
    };

    payload.insert("threedsAmount".into(), serde_json::json!(fields.amount));
    payload.insert("threedsCurrency".into(), fields.currency_code.into());

    let status_raw = str_field(threeds, &["status", "threedsStatus"]).to_uppercase();
    let success = match threeds.get("success") {
        Some(v) => truthy(v),
        None => threeds.get("threedsSuccess").map(truthy).unwrap_or(false),
    };
    let verified = success || status_raw == "Y" || status_raw == "A";

    if verified {
        insert_if_nonempty(
            &mut payload,
            "threedsEci",
            str_field(threeds, &["eci", "threedsEci"]),
        );
        payload.insert(
            "threedsStatus".into(),
            Value::String(if status_raw.is_empty() {
                "Y".to_string()
            } else {
                status_raw
            }),
        );
        payload.insert("threedsSuccess".into(), Value::Bool(true));
        insert_if_nonempty(
            &mut payload,
            "threedsVersion",
            str_field(threeds, &["protocolVersion", "version", "threedsVersion"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsClientTransactionId",
            str_field(
                threeds,
                &["clientTransactionId", "threedsClientTransactionId"],
            ),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsSdkTransId",
            str_field(threeds, &["sdkTransId", "threedsSdkTransId"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsAcsTransId",
            str_field(threeds, &["acsTransId", "threedsAcsTransId"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsDsTransId",
            str_field(threeds, &["dsTransId", "threedsDsTransId"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsAuthenticationType",
            str_field(threeds, &["authenticationType"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsAuthenticationValue",
            str_field(threeds, &["authenticationValue"]),
        );
        insert_if_nonempty(
            &mut payload,
            "threedsCardToken",
            str_field(threeds, &["cardToken"]),
        );
    } else {
        payload.insert(
            "threedsError".into(),
            Value::String("AUTHENTICATION_FAILED".to_string()),
        );
        // Absent/null defaults; a field the widget sent as "" stays "".
        payload.insert(
            "threedsErrorDetail".into(),
            Value::String(
                str_field_opt(threeds, &["transStatusReasonDetail"])
                    .unwrap_or_else(|| "Card authentication failed".to_string()),
            ),
        );
        payload.insert(
            "threedsErrorCode".into(),
            Value::String(
                str_field_opt(threeds, &["transStatusReason"])
                    .unwrap_or_else(|| "01".to_string()),
            ),
        );
        payload.insert(
            "threedsResponse".into(),
            Value::String(
                serde_json::to_string(&Value::Object(threeds.clone())).unwrap_or_default(),
            ),
        );
        payload.insert(
            "threedsStatus".into(),
            Value::String(if status_raw.is_empty() {
                "N".to_string()
            } else {
                status_raw
            }),
        );
        payload.insert("threedsSuccess".into(), Value::Bool(false));
        payload.insert(
            "threedsEci".into(),
            Value::String(str_field_opt(threeds, &["eci"]).unwrap_or_else(|| "07".to_string())),
        );
        payload.insert(
            "threedsVersion".into(),
            Value::String(str_field(threeds, &["protocolVersion", "version"])),
        );
    }

    PreparedPurchase {
        payload: Value::Object(payload),
        threeds_endpoint: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_amount2() {
        assert_eq!(to_amount2(&json!(12.346)), Some(12.35));
        assert_eq!(to_amount2(&json!("9.999")), Some(10.0));
        assert_eq!(to_amount2(&json!(5)), Some(5.0));
        assert_eq!(to_amount2(&json!("not a number")), None);
        assert_eq!(to_amount2(&json!(null)), None);
        assert_eq!(to_amount2(&json!([1.0])), None);
    }

    #[test]
    fn test_to_int() {
        assert_eq!(to_int(&json!(840)), Some(840));
        assert_eq!(to_int(&json!("840")), Some(840));
        assert_eq!(to_int(&json!(7.9)), Some(7));
        assert_eq!(to_int(&json!("abc")), None);
    }

    #[test]
    fn test_extract_fields_happy_path() {
        let body = json!({
            "paymentTokenId": "tok_123",
            "amount": "19.99",
            "currencyCode": "840",
            "clientAccnum": 999999,
            "clientSubacc": 1,
        });
        let fields = extract_fields(&body).unwrap();
        assert_eq!(fields.payment_token_id, "tok_123");
        assert_eq!(fields.amount, 19.99);
        assert_eq!(fields.currency_code, 840);
        assert!(fields.threeds.is_none());
    }

    #[test]
    fn test_extract_fields_missing_amount() {
        let body = json!({
            "paymentTokenId": "tok_123",
            "currencyCode": 840,
            "clientAccnum": 999999,
            "clientSubacc": 1,
        });
        assert!(matches!(
            extract_fields(&body),
            Err(DemoError::MissingFields)
        ));
    }

    #[test]
    fn test_extract_fields_empty_token_id() {
        let body = json!({
            "paymentTokenId": "",
            "amount": 1.0,
            "currencyCode": 840,
            "clientAccnum": 999999,
            "clientSubacc": 1,
        });
        assert!(extract_fields(&body).is_err());
    }

    fn base_fields(threeds: Option<serde_json::Value>) -> PurchaseFields {
        PurchaseFields {
            payment_token_id: "tok_1".to_string(),
            amount: 9.99,
            currency_code: 840,
            client_accnum: 999999,
            client_subacc: 1,
            threeds: threeds.and_then(|v| v.as_object().cloned()),
        }
    }

    #[test]
    fn test_plain_payload() {
        let prepared = build_payload(&base_fields(None));
        assert!(!prepared.threeds_endpoint);
        assert_eq!(prepared.payload["initialPrice"], json!(9.99));
        assert_eq!(prepared.payload["initialPeriod"], json!(30));
        assert!(prepared.payload.get("threedsAmount").is_none());
    }

    #[test]
    fn test_verified_threeds_payload() {
        let prepared = build_payload(&base_fields(Some(json!({
            "status": "y",
            "eci": "05",
            "protocolVersion": "2.2.0",
            "clientTransactionId": "ct-1",
            "authenticationValue": "cavv",
            "dsTransId": "",
        }))));
        assert!(prepared.threeds_endpoint);
        let p = &prepared.payload;
        assert_eq!(p["threedsSuccess"], json!(true));
        assert_eq!(p["threedsStatus"], json!("Y"));
        assert_eq!(p["threedsEci"], json!("05"));
        assert_eq!(p["threedsVersion"], json!("2.2.0"));
        assert_eq!(p["threedsClientTransactionId"], json!("ct-1"));
        assert_eq!(p["threedsAmount"], json!(9.99));
        assert_eq!(p["threedsCurrency"], json!(840));
        // empty fields are dropped, not sent as ""
        assert!(p.get("threedsDsTransId").is_none());
        assert!(p.get("threedsCardToken").is_none());
    }

    #[test]
    fn test_success_flag_alone_counts_as_verified() {
        let prepared = build_payload(&base_fields(Some(json!({
            "success": true,
        }))));
        let p = &prepared.payload;
        assert_eq!(p["threedsSuccess"], json!(true));
        assert_eq!(p["threedsStatus"], json!("Y"));
    }

    #[test]
    fn test_failed_threeds_payload() {
        let prepared = build_payload(&base_fields(Some(json!({
            "status": "N",
            "transStatusReason": "10",
            "transStatusReasonDetail": "Stolen card",
        }))));
        assert!(prepared.threeds_endpoint);
        let p = &prepared.payload;
        assert_eq!(p["threedsError"], json!("AUTHENTICATION_FAILED"));
        assert_eq!(p["threedsErrorCode"], json!("10"));
        assert_eq!(p["threedsErrorDetail"], json!("Stolen card"));
        assert_eq!(p["threedsStatus"], json!("N"));
        assert_eq!(p["threedsSuccess"], json!(false));
        assert_eq!(p["threedsEci"], json!("07"));
        // the raw widget result rides along for gateway-side diagnostics
        let raw: serde_json::Value =
            serde_json::from_str(p["threedsResponse"].as_str().unwrap()).unwrap();
        assert_eq!(raw["status"], json!("N"));
    }

    #[test]
    fn test_failed_threeds_keeps_present_empty_fields() {
        // Empty strings the widget actually sent are forwarded as-is; only
        // absent/null fields get the defaults. threedsStatus is the
        // exception — a blank status still collapses to "N".
        let prepared = build_payload(&base_fields(Some(json!({
            "status": "",
            "eci": "",
            "transStatusReason": "",
            "transStatusReasonDetail": "",
        }))));
        let p = &prepared.payload;
        assert_eq!(p["threedsErrorCode"], json!(""));
        assert_eq!(p["threedsErrorDetail"], json!(""));
        assert_eq!(p["threedsEci"], json!(""));
        assert_eq!(p["threedsStatus"], json!("N"));
    }

    #[test]
    fn test_failed_threeds_defaults() {
        let prepared = build_payload(&base_fields(Some(json!({}))));
        let p = &prepared.payload;
        assert_eq!(p["threedsErrorCode"], json!("01"));
        assert_eq!(p["threedsErrorDetail"], json!("Card authentication failed"));
        assert_eq!(p["threedsStatus"], json!("N"));
        assert_eq!(p["threedsVersion"], json!(""));
    }
}
