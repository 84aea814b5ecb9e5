//! Proxy records as written into the `proxies` list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Protocol of a proxy record
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    Vmess,
}

/// One upstream node
///
/// Only the name is treated as an identity; the other fields are copied
/// from the decoded link without validation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Proxy {
    pub name: String,

    #[serde(rename = "type")]
    pub proxy_type: ProxyType,

    pub server: String,

    pub port: u16,

    /// VMess security, e.g. `auto`, `aes-128-gcm`, `none`
    pub cipher: String,

    pub uuid: String,

    #[serde(rename = "alterId")]
    pub alter_id: u32,

    pub tls: bool,

    pub skip_cert_verify: bool,

    /// Transport name as given by the link (`ws`, `h2`, `http`, `grpc`, `tcp`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(flatten)]
    pub transport: Option<TransportOptions>,

    /// TLS server name indication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servername: Option<String>,
}

/// Transport-specific options; a record carries at most one of these
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportOptions {
    WsOpts(WsOptions),
    H2Opts(H2Options),
    HttpOpts(HttpOptions),
    GrpcOpts(GrpcOptions),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WsOptions {
    pub path: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct H2Options {
    pub path: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HttpOptions {
    pub path: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct GrpcOptions {
    pub service_name: String,
}

impl Proxy {
    /// Convert into a YAML value for insertion into a document
    pub fn to_value(&self) -> Result<serde_yaml::Value, serde_yaml::Error> {
        serde_yaml::to_value(self)
    }
}
