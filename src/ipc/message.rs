//! Messages exchanged over the pipe
//!
//! Every message is a `(key, value)` pair. On the wire each message is a
//! single JSON object on its own line:
//!
//! ```text
//! {"key":"status","value":"Connected"}
//! {"key":"count_rates","value":{"a":1200.0,"ab":14.0}}
//! {"key":"shutdown","value":null}
//! ```

use super::IpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;

/// Host -> GUI: new status line
pub const KEY_STATUS: &str = "status";
/// Host -> GUI: latest count rate per channel
pub const KEY_COUNT_RATES: &str = "count_rates";
/// Host -> GUI: close the window
pub const KEY_SHUTDOWN: &str = "shutdown";
/// GUI -> host: the window is going away
pub const KEY_GUI_QUIT: &str = "gui_quit";

/// Count rate per channel identifier
pub type CountRates = BTreeMap<String, f64>;

/// A decoded pipe message
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Text for the status label
    Status(String),
    /// Rates for some or all channels
    CountRates(CountRates),
    /// Request an orderly close of the window
    Shutdown,
    /// Emitted by the window once it has closed
    GuiQuit,
    /// Any key this version does not understand
    Unknown { key: String, value: Value },
}

/// Raw `(key, value)` pair as it appears on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    key: String,
    #[serde(default)]
    value: Value,
}

impl Message {
    /// Wire key of this message
    pub fn key(&self) -> &str {
        match self {
            Message::Status(_) => KEY_STATUS,
            Message::CountRates(_) => KEY_COUNT_RATES,
            Message::Shutdown => KEY_SHUTDOWN,
            Message::GuiQuit => KEY_GUI_QUIT,
            Message::Unknown { key, .. } => key,
        }
    }

    /// Build a message from a raw key and JSON value
    ///
    /// Unrecognized keys are not an error; they decode to [`Message::Unknown`].
    pub fn from_parts(key: &str, value: Value) -> Result<Self, IpcError> {
        match key {
            KEY_STATUS => match value {
                Value::String(text) => Ok(Message::Status(text)),
                other => Err(IpcError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("expected a string, got {}", other),
                }),
            },
            KEY_COUNT_RATES => {
                let rates: CountRates = serde_json::from_value(value)?;
                Ok(Message::CountRates(rates))
            }
            KEY_SHUTDOWN => Ok(Message::Shutdown),
            KEY_GUI_QUIT => Ok(Message::GuiQuit),
            _ => Ok(Message::Unknown {
                key: key.to_string(),
                value,
            }),
        }
    }

    fn value(&self) -> Value {
        match self {
            Message::Status(text) => Value::String(text.clone()),
            Message::CountRates(rates) => rates
                .iter()
                .map(|(channel, rate)| (channel.clone(), Value::from(*rate)))
                .collect::<serde_json::Map<_, _>>()
                .into(),
            Message::Shutdown | Message::GuiQuit => Value::Null,
            Message::Unknown { value, .. } => value.clone(),
        }
    }

    /// Encode as a single JSON line, without the trailing newline
    pub fn encode(&self) -> Result<String, IpcError> {
        let wire = WireMessage {
            key: self.key().to_string(),
            value: self.value(),
        };
        Ok(serde_json::to_string(&wire)?)
    }

    /// Decode one line of the wire format
    pub fn decode(line: &str) -> Result<Self, IpcError> {
        let wire: WireMessage = serde_json::from_str(line.trim())?;
        Self::from_parts(&wire.key, wire.value)
    }
}

/// Write one message to a pipe and flush it
pub fn write_message<W: Write + ?Sized>(writer: &mut W, message: &Message) -> Result<(), IpcError> {
    let line = message.encode()?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_status() {
        let msg = Message::decode(r#"{"key":"status","value":"Connected"}"#).unwrap();
        assert_eq!(msg, Message::Status("Connected".to_string()));
    }

    #[test]
    fn test_decode_count_rates_accepts_integers() {
        let msg = Message::decode(r#"{"key":"count_rates","value":{"ch1":10,"ch2":0.5}}"#).unwrap();
        let Message::CountRates(rates) = msg else {
            panic!("expected count rates");
        };
        assert_eq!(rates.get("ch1"), Some(&10.0));
        assert_eq!(rates.get("ch2"), Some(&0.5));
    }

    #[test]
    fn test_decode_shutdown_without_value() {
        assert_eq!(
            Message::decode(r#"{"key":"shutdown"}"#).unwrap(),
            Message::Shutdown
        );
        assert_eq!(
            Message::decode(r#"{"key":"shutdown","value":null}"#).unwrap(),
            Message::Shutdown
        );
    }

    #[test]
    fn test_unknown_key_is_kept() {
        let msg = Message::decode(r#"{"key":"histogram","value":[1,2,3]}"#).unwrap();
        assert_eq!(
            msg,
            Message::Unknown {
                key: "histogram".to_string(),
                value: json!([1, 2, 3]),
            }
        );
        assert_eq!(msg.key(), "histogram");
    }

    #[test]
    fn test_status_must_be_string() {
        let result = Message::decode(r#"{"key":"status","value":42}"#);
        assert!(matches!(result, Err(IpcError::InvalidValue { .. })));
    }

    #[test]
    fn test_count_rates_must_be_numeric() {
        let result = Message::decode(r#"{"key":"count_rates","value":{"a":"fast"}}"#);
        assert!(matches!(result, Err(IpcError::Codec(_))));
    }

    #[test]
    fn test_garbage_line_is_error() {
        assert!(Message::decode("not json").is_err());
        assert!(Message::decode(r#"{"value":1}"#).is_err());
    }

    #[test]
    fn test_encode_uses_null_for_control_messages() {
        let line = Message::GuiQuit.encode().unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value, json!({"key": "gui_quit", "value": null}));
    }

    #[test]
    fn test_write_message_appends_newline() {
        let mut buf = Vec::new();
        write_message(&mut buf, &Message::Status("ok".to_string())).unwrap();
        write_message(&mut buf, &Message::Shutdown).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(Message::decode(lines[1]).unwrap(), Message::Shutdown);
    }
}
