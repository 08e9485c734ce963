// Transform stage adapter: XML envelope over HTTP

use async_trait::async_trait;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use transflow_core::port::{StageError, TransformStage};

const TEXT_ELEMENT: &[u8] = b"text";

/// `<translation><text>{escaped}</text></translation>`
pub fn encode_envelope(text: &str) -> String {
    format!("<translation><text>{}</text></translation>", escape(text))
}

/// Content of the first `<text>` element anywhere in `xml`.
///
/// A document without one (for example an `<error>` reply) is an invalid response.
pub fn decode_envelope(xml: &str) -> Result<String, StageError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut depth_in_text = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| StageError::InvalidResponse(format!("XML parsing error: {}", e)))?;

        match event {
            Event::Start(ref e) if depth_in_text == 0 && e.local_name().as_ref() == TEXT_ELEMENT => {
                depth_in_text = 1;
            }
            Event::Start(_) if depth_in_text > 0 => depth_in_text += 1,
            Event::Empty(ref e) if depth_in_text == 0 && e.local_name().as_ref() == TEXT_ELEMENT => {
                return Ok(String::new());
            }
            Event::End(_) if depth_in_text > 0 => {
                depth_in_text -= 1;
                if depth_in_text == 0 {
                    return Ok(text);
                }
            }
            Event::Text(ref e) if depth_in_text > 0 => {
                text.push_str(&unescape_raw(e)?);
            }
            Event::GeneralRef(ref e) if depth_in_text > 0 => {
                let name = raw_str(e)?;
                text.push_str(&unescape_raw(format!("&{};", name).as_bytes())?);
            }
            Event::CData(ref e) if depth_in_text > 0 => {
                text.push_str(raw_str(e)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(StageError::InvalidResponse(
        "response has no <text> element".to_string(),
    ))
}

fn raw_str(bytes: &[u8]) -> Result<&str, StageError> {
    std::str::from_utf8(bytes)
        .map_err(|e| StageError::InvalidResponse(format!("invalid UTF-8 in XML: {}", e)))
}

fn unescape_raw(bytes: &[u8]) -> Result<String, StageError> {
    let raw = raw_str(bytes)?;
    unescape(raw)
        .map(|s| s.into_owned())
        .map_err(|e| StageError::InvalidResponse(format!("XML unescape error: {}", e)))
}

/// Posts the envelope to the transform service and unwraps its reply
pub struct XmlTransformClient {
    client: reqwest::Client,
    url: String,
}

impl XmlTransformClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl TransformStage for XmlTransformClient {
    async fn transform(&self, text: &str) -> Result<String, StageError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .body(encode_envelope(text))
            .send()
            .await
            .map_err(|e| StageError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StageError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(StageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let transformed = decode_envelope(&body)?;
        debug!(chars = transformed.chars().count(), "Transform stage replied");
        Ok(transformed)
    }
}
