//! VMess link decoder
//!
//! A `vmess://` link is the Base64 encoding of a flat JSON object in the
//! V2RayN share format:
//! `{ "v": "2", "ps": "name", "add": "host", "port": 443, "id": "uuid", ... }`.
//! Numeric fields show up as either JSON numbers or strings.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::trace;

use crate::config::proxy::{
    GrpcOptions, H2Options, HttpOptions, Proxy, ProxyType, TransportOptions, WsOptions,
};
use crate::parser::base64::decode_base64_text;

use super::LinkDecoder;

const DEFAULT_NAME: &str = "Unknown";
const DEFAULT_CIPHER: &str = "auto";
const DEFAULT_PATH: &str = "/";

// ============================================================================
// VMess Decoder
// ============================================================================

/// Decoder for VMess (vmess://) links
pub struct VMessDecoder {
    skip_cert_verify: bool,
}

impl VMessDecoder {
    /// `skip_cert_verify` is written as is into every decoded record
    pub fn new(skip_cert_verify: bool) -> Self {
        Self { skip_cert_verify }
    }
}

/// V2RayN share JSON
///
/// Text fields also accept numbers, booleans and `null`, which some
/// generators emit.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct VMessJson {
    /// Remark, used as the proxy name
    #[serde(deserialize_with = "deserialize_text")]
    ps: String,
    /// Server address
    #[serde(deserialize_with = "deserialize_text")]
    add: String,
    #[serde(deserialize_with = "deserialize_port")]
    port: u16,
    /// User UUID
    #[serde(deserialize_with = "deserialize_text")]
    id: String,
    /// Alter ID
    #[serde(deserialize_with = "deserialize_option_u32")]
    aid: Option<u32>,
    /// Security/encryption method
    #[serde(deserialize_with = "deserialize_text")]
    scy: String,
    /// Transport: tcp, ws, h2, http, grpc, ...
    #[serde(deserialize_with = "deserialize_text")]
    net: String,
    /// "tls" when TLS is on
    #[serde(deserialize_with = "deserialize_text")]
    tls: String,
    #[serde(deserialize_with = "deserialize_text")]
    sni: String,
    /// Host header, or SNI fallback
    #[serde(deserialize_with = "deserialize_text")]
    host: String,
    /// Transport path; the gRPC service name for grpc
    #[serde(deserialize_with = "deserialize_text")]
    path: String,
    #[serde(rename = "serviceName", deserialize_with = "deserialize_text")]
    service_name: String,
}

impl LinkDecoder for VMessDecoder {
    fn scheme(&self) -> &str {
        "vmess"
    }

    fn decode(&self, link: &str) -> Result<Proxy> {
        let encoded = link
            .trim()
            .strip_prefix("vmess://")
            .ok_or_else(|| anyhow!("Invalid VMess link: missing vmess:// prefix"))?;

        let json = match parse_payload(encoded) {
            Ok(json) => json,
            // Unpadded payloads can absorb a trailing `-` or `_` from the surrounding text
            Err(e) => {
                let trimmed = encoded.trim_end_matches(['-', '_']);
                if trimmed.is_empty() || trimmed.len() == encoded.len() {
                    return Err(e);
                }
                trace!("Retrying VMess payload without its trailing separator");
                parse_payload(trimmed).map_err(|_| e)?
            }
        };

        trace!(
            "VMess node: server={}:{}, net={:?}, tls={:?}",
            json.add, json.port, json.net, json.tls
        );

        let tls = json.tls == "tls";
        let servername = if tls {
            non_empty(&json.sni).or_else(|| non_empty(&json.host))
        } else {
            None
        };

        Ok(Proxy {
            name: non_empty(&json.ps).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            proxy_type: ProxyType::Vmess,
            server: json.add.clone(),
            port: json.port,
            cipher: non_empty(&json.scy).unwrap_or_else(|| DEFAULT_CIPHER.to_string()),
            uuid: json.id.clone(),
            alter_id: json.aid.unwrap_or(0),
            tls,
            skip_cert_verify: self.skip_cert_verify,
            network: non_empty(&json.net),
            transport: build_transport(&json),
            servername,
        })
    }
}

fn parse_payload(encoded: &str) -> Result<VMessJson> {
    let decoded = decode_base64_text(encoded).context("Failed to decode VMess link")?;
    trace!("Decoded VMess JSON: {}", decoded);
    serde_json::from_str(&decoded).context("Failed to parse VMess JSON")
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Transport options for the link's `net`; `None` for plain TCP and unknown transports
fn build_transport(json: &VMessJson) -> Option<TransportOptions> {
    let path = non_empty(&json.path).unwrap_or_else(|| DEFAULT_PATH.to_string());
    let host = non_empty(&json.host);

    match json.net.as_str() {
        "ws" => Some(TransportOptions::WsOpts(WsOptions {
            path,
            headers: host
                .map(|host| BTreeMap::from([("host".to_string(), host)]))
                .unwrap_or_default(),
        })),
        "h2" => Some(TransportOptions::H2Opts(H2Options {
            path,
            host: host.into_iter().collect(),
        })),
        "http" => Some(TransportOptions::HttpOpts(HttpOptions {
            path: vec![path],
            headers: host
                .map(|host| BTreeMap::from([("host".to_string(), vec![host])]))
                .unwrap_or_default(),
        })),
        "grpc" => Some(TransportOptions::GrpcOpts(GrpcOptions {
            service_name: non_empty(&json.path)
                .or_else(|| non_empty(&json.service_name))
                .unwrap_or_default(),
        })),
        _ => None,
    }
}

// ============================================================================
// Deserialization Helpers
// ============================================================================

/// Custom deserializer for text fields (handles string, number, bool and null)
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextValue {
        String(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    Ok(match Option::<TextValue>::deserialize(deserializer)? {
        Some(TextValue::String(s)) => s,
        Some(TextValue::Number(n)) => n.to_string(),
        Some(TextValue::Bool(b)) => b.to_string(),
        None => String::new(),
    })
}

/// Custom deserializer for port (handles both string and number)
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        String(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(n) => Ok(n),
        PortValue::String(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("invalid port '{}'", s))
        }),
    }
}

/// Custom deserializer for optional u32 (handles number, string, empty string and null)
fn deserialize_option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum U32Value {
        Number(u32),
        String(String),
    }

    match Option::<U32Value>::deserialize(deserializer)? {
        Some(U32Value::Number(n)) => Ok(Some(n)),
        Some(U32Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(U32Value::String(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
