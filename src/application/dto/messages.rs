//! WebSocket Message Types
//!
//! The remote service speaks free-form JSON. The only outbound frame is the
//! liveness ping; the only recognised inbound shape is an object carrying
//! both `pointsTotal` and `pointsToday`.

use serde::Serialize;
use serde_json::Value;

use crate::domain::entities::PointsUpdate;

/// Outgoing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "PING")]
    Ping,
}

impl OutboundMessage {
    pub fn to_json(&self) -> String {
        match self {
            OutboundMessage::Ping => r#"{"type":"PING"}"#.to_string(),
        }
    }
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Both points fields present with usable values.
    Points(PointsUpdate),
    /// Both points fields present, but not non-negative numbers.
    InvalidPoints(Value),
    /// Any other JSON. Ignored, kept for logging.
    Other(Value),
}

impl InboundMessage {
    /// Parse and classify a text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the frame is not valid JSON.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::classify(value))
    }

    fn classify(value: Value) -> Self {
        let (Some(total), Some(today)) = (value.get("pointsTotal"), value.get("pointsToday")) else {
            return InboundMessage::Other(value);
        };

        match (total.as_f64(), today.as_f64()) {
            (Some(total), Some(today)) => match PointsUpdate::new(total, today) {
                Some(update) => InboundMessage::Points(update),
                None => InboundMessage::InvalidPoints(value),
            },
            _ => InboundMessage::InvalidPoints(value),
        }
    }
}
