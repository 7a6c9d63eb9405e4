use crate::{Error, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use once_cell::sync::Lazy;
use regex::Regex;

static DATA_URL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/([\w.+-]+);base64,").unwrap());

const DEFAULT_SUBTYPE: &str = "png";

/// A base64 image received from a client, validated and decoded.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    subtype: Option<String>,
    base64: String,
    bytes: Vec<u8>,
}

/// Removes a leading `data:image/<subtype>;base64,` prefix if present.
pub fn strip_data_url_prefix(data: &str) -> &str {
    match DATA_URL_PREFIX_RE.find(data) {
        Some(m) => &data[m.end()..],
        None => data,
    }
}

impl ImagePayload {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let subtype = DATA_URL_PREFIX_RE
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());

        let base64 = strip_data_url_prefix(raw);
        if base64.is_empty() {
            return Err(Error::invalid_image("image payload is empty"));
        }

        let bytes = STANDARD
            .decode(base64)
            .map_err(|e| Error::invalid_image(format!("image payload is not valid base64: {e}")))?;

        Ok(Self {
            subtype,
            base64: base64.to_string(),
            bytes,
        })
    }

    /// MIME subtype from the data-URL prefix, `png` when none was given.
    pub fn subtype(&self) -> &str {
        self.subtype.as_deref().unwrap_or(DEFAULT_SUBTYPE)
    }

    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_url(&self) -> String {
        format!("data:image/{};base64,{}", self.subtype(), self.base64)
    }
}
