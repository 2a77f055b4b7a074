//! Signed envelopes the host POSTs to the mini-app's webhook.
//!
//! Each of `header`, `payload` and `signature` is base64url. Hosts differ on
//! whether they pad, so decoding accepts both.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use miniapp_core::schema::{Object, ROOT, Schema, ValidationError};
use miniapp_core::webhook::WebhookHeader;
use miniapp_core::{Fid, ServerEvent};
use serde::Serialize;
use serde_json::Value;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookEnvelope {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

/// An envelope after base64 and header validation.
///
/// `event` is left raw; the dispatcher validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEnvelope {
    pub header: WebhookHeader,
    pub event: Value,
    pub signature: Vec<u8>,
}

impl DecodedEnvelope {
    pub fn fid(&self) -> Fid {
        self.header.fid
    }
}

impl Schema for WebhookEnvelope {
    fn validate_at(raw: &Value, path: &str) -> Result<Self, ValidationError> {
        let obj = Object::new(raw, path)?;
        Ok(Self {
            header: obj.bounded_str("header", usize::MAX)?.to_string(),
            payload: obj.bounded_str("payload", usize::MAX)?.to_string(),
            signature: obj.bounded_str("signature", usize::MAX)?.to_string(),
        })
    }
}

impl WebhookEnvelope {
    /// Build an unpadded envelope. Used by hosts and test harnesses.
    pub fn encode(
        header: &WebhookHeader,
        event: &ServerEvent,
        signature: &[u8],
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            header: URL_SAFE_NO_PAD.encode(serde_json::to_vec(header)?),
            payload: URL_SAFE_NO_PAD.encode(serde_json::to_vec(event)?),
            signature: URL_SAFE_NO_PAD.encode(signature),
        })
    }

    /// Decode all three parts and validate the header.
    ///
    /// The signature is decoded but not verified.
    pub fn decode(&self) -> Result<DecodedEnvelope, ValidationError> {
        let header_path = format!("{ROOT}.header");
        let header = decode_json(&self.header, &header_path)?;
        Ok(DecodedEnvelope {
            header: WebhookHeader::validate_at(&header, &header_path)?,
            event: decode_json(&self.payload, &format!("{ROOT}.payload"))?,
            signature: decode_bytes(&self.signature, &format!("{ROOT}.signature"))?,
        })
    }
}

fn decode_bytes(encoded: &str, path: &str) -> Result<Vec<u8>, ValidationError> {
    URL_SAFE_LENIENT
        .decode(encoded)
        .map_err(|e| ValidationError::format(path, format!("invalid base64url: {e}")))
}

fn decode_json(encoded: &str, path: &str) -> Result<Value, ValidationError> {
    let bytes = decode_bytes(encoded, path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ValidationError::format(path, format!("invalid json: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;
    use miniapp_core::webhook::SignerKind;
    use serde_json::json;

    fn header() -> WebhookHeader {
        WebhookHeader {
            fid: Fid::new(42),
            signer: SignerKind::AppKey,
            key: "0xabcdef".into(),
        }
    }

    #[test]
    fn encode_then_decode() {
        let envelope =
            WebhookEnvelope::encode(&header(), &ServerEvent::NotificationsDisabled, b"sig").unwrap();
        let decoded = envelope.decode().unwrap();
        assert_eq!(decoded.fid(), Fid::new(42));
        assert_eq!(decoded.event, json!({"event": "notifications_disabled"}));
        assert_eq!(decoded.signature, b"sig");
    }

    #[test]
    fn padded_parts_are_accepted() {
        let envelope = WebhookEnvelope {
            header: URL_SAFE.encode(br#"{"fid":7,"type":"custody","key":"0x0a1"}"#),
            payload: URL_SAFE.encode(br#"{"event":"frame_removed"}"#),
            signature: URL_SAFE.encode(b"s"),
        };
        assert!(envelope.header.ends_with('='));
        let decoded = envelope.decode().unwrap();
        assert_eq!(decoded.fid(), Fid::new(7));
    }

    #[test]
    fn payload_is_not_validated_here() {
        let envelope = WebhookEnvelope {
            header: URL_SAFE_NO_PAD.encode(br#"{"fid":7,"type":"custody","key":"0x01"}"#),
            payload: URL_SAFE_NO_PAD.encode(br#"{"event":"frame_updated"}"#),
            signature: String::from("c2ln"),
        };
        let decoded = envelope.decode().unwrap();
        assert_eq!(decoded.event["event"], "frame_updated");
    }

    #[test]
    fn bad_header_reports_nested_path() {
        let envelope = WebhookEnvelope {
            header: URL_SAFE_NO_PAD.encode(br#"{"fid":"42","type":"custody","key":"0x01"}"#),
            payload: URL_SAFE_NO_PAD.encode(br#"{"event":"frame_removed"}"#),
            signature: String::from("c2ln"),
        };
        assert_eq!(envelope.decode().unwrap_err().path, "$.header.fid");
    }

    #[test]
    fn garbage_is_rejected() {
        let envelope = WebhookEnvelope {
            header: "not base64!".into(),
            payload: "e30".into(),
            signature: "c2ln".into(),
        };
        assert_eq!(envelope.decode().unwrap_err().path, "$.header");

        let envelope = WebhookEnvelope {
            header: URL_SAFE_NO_PAD.encode(b"not json"),
            payload: "e30".into(),
            signature: "c2ln".into(),
        };
        assert_eq!(envelope.decode().unwrap_err().path, "$.header");
    }

    #[test]
    fn envelope_fields_are_required() {
        let err = WebhookEnvelope::validate(&json!({"header": "a", "payload": "b"})).unwrap_err();
        assert_eq!(err.path, "$.signature");
    }
}
