//! Output contracts: what a unit of work's final answer must look like.
//!
//! A contract turns the worker's raw reply into the conformed text that is
//! written to disk and handed downstream as context. Violations are fatal for
//! the unit of work; nothing is repaired or retried here.

use std::fmt;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::inputs::RunInputs;

/// The conformed output of a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformed {
    pub raw: String,
    pub json: Option<Value>,
}

pub trait OutputContract: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// JSON schema of the expected answer, for contracts that have one.
    fn json_schema(&self) -> Option<Value> {
        None
    }

    fn conform(&self, raw: &str, inputs: &RunInputs) -> Result<Conformed, SchemaError>;
}

/// Post-deserialization checks and filtering that depend on the run inputs.
pub trait Conform: Sized {
    fn conform(self, inputs: &RunInputs) -> Result<Self, SchemaError>;
}

/// The body of the first markdown code fence (```json ... ```) in a reply, or
/// the trimmed reply when it has no complete fence.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[open + 3..];
    // drop the language tag line
    let Some(nl) = after.find('\n') else {
        return trimmed;
    };
    let body = &after[nl + 1..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => trimmed,
    }
}

/// The first complete JSON object in a reply, tolerating prose around it.
pub fn extract_json(raw: &str) -> Option<&str> {
    first_object(strip_code_fence(raw)).or_else(|| first_object(raw))
}

fn first_object(body: &str) -> Option<&str> {
    body.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(_))) => Some(&body[start..start + stream.byte_offset()]),
            _ => None,
        }
    })
}

/// Cut an HTML document out of surrounding text: from the first `<!doctype`
/// or `<html` to the end of the last `</html>`.
fn html_document(body: &str) -> Option<&str> {
    let lower = body.to_ascii_lowercase();
    let start = [lower.find("<!doctype html"), lower.find("<html")]
        .into_iter()
        .flatten()
        .min()?;
    let end = lower
        .rfind("</html>")
        .filter(|&end| end > start)
        .map_or(body.len(), |end| end + "</html>".len());
    Some(body[start..end].trim())
}

/// Contract for answers that deserialize into `T`.
pub struct JsonContract<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonContract<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for JsonContract<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonContract").field(&self.name).finish()
    }
}

impl<T> OutputContract for JsonContract<T>
where
    T: DeserializeOwned + Serialize + JsonSchema + Conform + 'static,
{
    fn name(&self) -> &str {
        self.name
    }

    fn json_schema(&self) -> Option<Value> {
        serde_json::to_value(schemars::schema_for!(T)).ok()
    }

    fn conform(&self, raw: &str, inputs: &RunInputs) -> Result<Conformed, SchemaError> {
        let body = extract_json(raw).ok_or_else(|| SchemaError::NoJson(preview(raw)))?;
        let parsed: T = serde_json::from_str(body).map_err(|source| SchemaError::Shape {
            schema: self.name,
            source,
        })?;
        let conformed = parsed.conform(inputs)?;
        let json = serde_json::to_value(&conformed).map_err(|source| SchemaError::Shape {
            schema: self.name,
            source,
        })?;
        let raw = serde_json::to_string_pretty(&json).map_err(|source| SchemaError::Shape {
            schema: self.name,
            source,
        })?;
        Ok(Conformed {
            raw,
            json: Some(json),
        })
    }
}

/// Contract for an HTML document that must contain a fixed set of section headings.
#[derive(Debug, Clone)]
pub struct HtmlContract {
    sections: &'static [&'static str],
}

impl HtmlContract {
    pub fn with_sections(sections: &'static [&'static str]) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &'static [&'static str] {
        self.sections
    }
}

impl OutputContract for HtmlContract {
    fn name(&self) -> &str {
        "html"
    }

    fn conform(&self, raw: &str, _inputs: &RunInputs) -> Result<Conformed, SchemaError> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(SchemaError::Empty);
        }
        let document = html_document(body)
            .or_else(|| html_document(raw))
            .ok_or(SchemaError::NotHtml)?;

        let lower = document.to_lowercase();

        let missing: Vec<&'static str> = self
            .sections
            .iter()
            .copied()
            .filter(|section| !lower.contains(&section.to_lowercase()))
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingSections(missing));
        }

        Ok(Conformed {
            raw: document.to_string(),
            json: None,
        })
    }
}

/// Free text; only emptiness is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextContract;

impl OutputContract for TextContract {
    fn name(&self) -> &str {
        "text"
    }

    fn conform(&self, raw: &str, _inputs: &RunInputs) -> Result<Conformed, SchemaError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(SchemaError::Empty);
        }
        Ok(Conformed {
            raw: text.to_string(),
            json: None,
        })
    }
}

fn preview(raw: &str) -> String {
    const LIMIT: usize = 120;
    match raw.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &raw[..idx]),
        None => raw.to_string(),
    }
}
