//! Request payloads and the encoder that maps them onto HTTP requests.
//!
//! The backend mixes conventions: some endpoints read a query string, some a
//! JSON body and one a multipart upload. Callers build a [`Payload`] that says
//! which shape they mean, and [`EncodedRequest::post`] produces the matching
//! request form. [`Payload::infer`] recovers the shape from an untyped JSON
//! mapping for callers that only have one.

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display, IntoStaticStr};

use crate::{Error, Result};

/// Payload key routed into the `?query=` parameter.
pub const QUERY_KEY: &str = "query";

/// Payload key routed into its own named parameter when it is the only entry.
pub const NAMED_PARAM_KEY: &str = "embedding_model_name";

/// Multipart field name for uploaded documents.
pub const FILE_FIELD: &str = "pdf_file";

/// HTTP method of an encoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

/// A document to upload: a file name and its raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    /// File name reported to the backend and recorded in the session.
    pub file_name: String,
    /// File contents.
    pub bytes: Bytes,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Creates a new document.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Returns the size of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the document has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The encoding selected for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Encoding {
    /// Multipart form data with the file under [`FILE_FIELD`].
    Multipart,
    /// `?query=<value>`, no body.
    QueryString,
    /// `?<key>=<value>`, no body.
    NamedParam,
    /// JSON request body.
    JsonBody,
}

/// A semantic request payload. Exactly one shape per call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent as a JSON request body.
    Json(Value),
    /// Sent as `?query=<value>`.
    Query(String),
    /// Sent as `?<key>=<value>`.
    Named {
        /// Parameter name.
        key: String,
        /// Parameter value.
        value: String,
    },
    /// Sent as multipart form data.
    File(Document),
}

impl Payload {
    /// Creates a JSON body payload from any serializable value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let value = serde_json::to_value(value).map_err(|e| {
            Error::validation()
                .with_message("Payload is not representable as JSON")
                .with_source(e)
        })?;
        Ok(Self::Json(value))
    }

    /// Creates a `?query=` payload.
    pub fn query(text: impl Into<String>) -> Self {
        Self::Query(text.into())
    }

    /// Creates a single named query parameter payload.
    pub fn named(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Named {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Creates a multipart upload payload.
    pub fn file(document: Document) -> Self {
        Self::File(document)
    }

    /// Selects a payload shape from an untyped mapping, in precedence order:
    ///
    /// 1. an attached file wins and the mapping is ignored;
    /// 2. a mapping with a `query` key becomes `?query=<value>`, other keys dropped;
    /// 3. a mapping whose only key is `embedding_model_name` becomes that parameter;
    /// 4. anything else is sent as a JSON body.
    pub fn infer(payload: Value, file: Option<Document>) -> Self {
        if let Some(document) = file {
            return Self::File(document);
        }

        let Value::Object(map) = payload else {
            return Self::Json(payload);
        };

        if let Some(value) = map.get(QUERY_KEY) {
            return Self::Query(param_value(value));
        }

        if map.len() == 1
            && let Some(value) = map.get(NAMED_PARAM_KEY)
        {
            return Self::named(NAMED_PARAM_KEY, param_value(value));
        }

        Self::Json(Value::Object(map))
    }

    /// Returns the encoding this payload is sent with.
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Json(_) => Encoding::JsonBody,
            Self::Query(_) => Encoding::QueryString,
            Self::Named { .. } => Encoding::NamedParam,
            Self::File(_) => Encoding::Multipart,
        }
    }
}

/// Renders a JSON value the way it appears in a query string.
fn param_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Body of an encoded request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON body.
    Json(Value),
    /// Multipart form with a single file part.
    Multipart {
        /// Form field name.
        field: &'static str,
        /// The uploaded document.
        document: Document,
    },
}

/// A transport-independent HTTP request: method, relative path, query pairs
/// and body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the backend origin, without a leading slash.
    pub path: String,
    /// Query string pairs, unescaped.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
}

impl EncodedRequest {
    /// Encodes a GET request for `path`.
    pub fn get(path: impl AsRef<str>) -> Self {
        Self {
            method: Method::Get,
            path: normalize_path(path.as_ref()),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Encodes a POST request for `path` carrying `payload`.
    pub fn post(path: impl AsRef<str>, payload: Payload) -> Self {
        let (query, body) = match payload {
            Payload::File(document) => (
                Vec::new(),
                RequestBody::Multipart {
                    field: FILE_FIELD,
                    document,
                },
            ),
            Payload::Query(text) => (vec![(QUERY_KEY.to_owned(), text)], RequestBody::Empty),
            Payload::Named { key, value } => (vec![(key, value)], RequestBody::Empty),
            Payload::Json(value) => (Vec::new(), RequestBody::Json(value)),
        };

        Self {
            method: Method::Post,
            path: normalize_path(path.as_ref()),
            query,
            body,
        }
    }

    /// Returns the encoding used by this request, `None` for a bare GET.
    pub fn encoding(&self) -> Option<Encoding> {
        match (&self.body, self.query.first()) {
            (RequestBody::Multipart { .. }, _) => Some(Encoding::Multipart),
            (RequestBody::Json(_), _) => Some(Encoding::JsonBody),
            (RequestBody::Empty, Some((key, _))) if key == QUERY_KEY => {
                Some(Encoding::QueryString)
            }
            (RequestBody::Empty, Some(_)) => Some(Encoding::NamedParam),
            (RequestBody::Empty, None) => None,
        }
    }

    /// Returns the value of the query parameter `key`, if present.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the JSON body, if this request carries one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_start_matches('/').to_owned()
}
