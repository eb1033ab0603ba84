use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use federation_core::trace::{IDEMPOTENT_KEY, TRACING_ID_KEY};
use federation_events::{DomainEvent, EventError, EventType};

use super::BusError;

/// Attribute carrying the [`EventType`] discriminator.
pub const EVENT_TYPE_KEY: &str = "x-event-type";
/// Stream field holding the JSON body.
pub const BODY_FIELD: &str = "body";

/// What travels on the bus: the event payload plus string attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub body: Value,
    pub attributes: BTreeMap<String, String>,
}

impl Envelope {
    pub fn for_event(
        event: &DomainEvent,
        trace_id: Uuid,
        idempotency_key: Uuid,
    ) -> Result<Self, serde_json::Error> {
        let attributes = BTreeMap::from([
            (EVENT_TYPE_KEY.to_owned(), event.event_type().as_str().to_owned()),
            (TRACING_ID_KEY.to_owned(), trace_id.to_string()),
            (IDEMPOTENT_KEY.to_owned(), idempotency_key.to_string()),
        ]);
        Ok(Self {
            body: event.to_payload()?,
            attributes,
        })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.attribute(IDEMPOTENT_KEY)
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.attribute(TRACING_ID_KEY)
    }

    /// Decode the body using the `x-event-type` attribute.
    pub fn decode(&self) -> Result<DomainEvent, EventError> {
        let event_type: EventType = self
            .attribute(EVENT_TYPE_KEY)
            .ok_or_else(|| EventError::UnknownType(format!("<missing {EVENT_TYPE_KEY}>")))?
            .parse()?;
        event_type.decode(self.body.clone())
    }

    /// Flatten into stream fields: the JSON body plus one field per attribute.
    pub fn to_fields(&self) -> Result<Vec<(String, String)>, BusError> {
        let body =
            serde_json::to_string(&self.body).map_err(|e| BusError::Malformed(e.to_string()))?;
        let mut fields = Vec::with_capacity(self.attributes.len() + 1);
        fields.push((BODY_FIELD.to_owned(), body));
        fields.extend(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(fields)
    }

    pub fn from_fields(mut fields: HashMap<String, String>) -> Result<Self, BusError> {
        let raw = fields
            .remove(BODY_FIELD)
            .ok_or_else(|| BusError::Malformed(format!("missing `{BODY_FIELD}` field")))?;
        let body = serde_json::from_str(&raw).map_err(|e| BusError::Malformed(e.to_string()))?;
        Ok(Self {
            body,
            attributes: fields.into_iter().collect(),
        })
    }
}
