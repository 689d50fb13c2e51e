//! Tool catalogue and `tools/call` dispatch.
//!
//! | Tool            | Arguments                                | Result |
//! |-----------------|------------------------------------------|--------|
//! | `get_speakers`  | none                                     | engine speakers JSON |
//! | `speak`         | `{turns: [{text, speaker?}]}` or `{text, speaker?}` | queue receipt |
//! | `stop_speaking` | none                                     | confirmation |
//!
//! Failures of the speech layer are reported inside the tool result
//! (`isError: true`); only malformed calls become JSON-RPC errors.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use vvmcp_core::{SpeechPort, SpeechPortError, TurnRequest};

use crate::protocol::JsonRpcError;

pub const GET_SPEAKERS: &str = "get_speakers";
pub const SPEAK: &str = "speak";
pub const STOP_SPEAKING: &str = "stop_speaking";

/// Entry of the `tools/list` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// The three tools, in a stable order.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: GET_SPEAKERS,
            description: "List the speakers (voices and styles) offered by the VOICEVOX engine. \
                          Use a style `id` as the `speaker` of a turn.",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolDescriptor {
            name: SPEAK,
            description: "Speak a dialogue aloud. Each turn is spoken in order with its own \
                          speaker; dialogues are queued and played one after another. Returns \
                          as soon as the dialogue is queued.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "turns": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "text": {
                                    "type": "string",
                                    "description": "Text to speak"
                                },
                                "speaker": {
                                    "type": "integer",
                                    "minimum": 0,
                                    "description": "Speaker style id (defaults to the configured speaker)"
                                }
                            },
                            "required": ["text"]
                        }
                    }
                },
                "required": ["turns"]
            }),
        },
        ToolDescriptor {
            name: STOP_SPEAKING,
            description: "Stop the dialogue being spoken and discard all queued dialogues.",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of a `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpeakArguments {
    Dialogue { turns: Vec<TurnRequest> },
    Single(TurnRequest),
}

impl SpeakArguments {
    fn into_turns(self) -> Vec<TurnRequest> {
        match self {
            Self::Dialogue { turns } => turns,
            Self::Single(turn) => vec![turn],
        }
    }
}

/// Dispatch a `tools/call` request to the speech port.
pub async fn call_tool(
    port: &dyn SpeechPort,
    params: Option<Value>,
) -> Result<ToolCallResult, JsonRpcError> {
    let params: ToolCallParams = params
        .ok_or_else(|| JsonRpcError::invalid_params("missing tool call parameters"))
        .and_then(|p| serde_json::from_value(p).map_err(JsonRpcError::invalid_params))?;

    tracing::debug!(tool = %params.name, "Tool call");

    match params.name.as_str() {
        GET_SPEAKERS => Ok(match port.list_speakers().await {
            Ok(speakers) => match serde_json::to_string_pretty(&speakers) {
                Ok(text) => ToolCallResult::text(text),
                Err(e) => ToolCallResult::error(format!("Failed to encode speakers: {e}")),
            },
            Err(e) => port_failure(GET_SPEAKERS, &e),
        }),
        SPEAK => {
            let arguments = params
                .arguments
                .ok_or_else(|| JsonRpcError::invalid_params("speak requires arguments"))?;
            let turns = serde_json::from_value::<SpeakArguments>(arguments)
                .map_err(|_| {
                    JsonRpcError::invalid_params(
                        "speak expects {turns: [{text, speaker?}]} or {text, speaker?}",
                    )
                })?
                .into_turns();

            Ok(match port.speak(turns).await {
                Ok(receipt) => {
                    let mut text = format!("Queued {} turn(s)", receipt.turns);
                    if receipt.queued_ahead > 0 {
                        text.push_str(&format!(
                            ", {} dialogue(s) ahead",
                            receipt.queued_ahead
                        ));
                    }
                    ToolCallResult::text(text)
                }
                Err(e) => port_failure(SPEAK, &e),
            })
        }
        STOP_SPEAKING => Ok(match port.stop().await {
            Ok(()) => ToolCallResult::text("Stopped"),
            Err(e) => port_failure(STOP_SPEAKING, &e),
        }),
        other => Err(JsonRpcError::invalid_params(format!("unknown tool: {other}"))),
    }
}

fn port_failure(tool: &str, err: &SpeechPortError) -> ToolCallResult {
    tracing::warn!(tool, error = %err, "Tool call failed");
    ToolCallResult::error(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_list_exactly_three_tools() {
        let names: Vec<_> = tool_descriptors().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["get_speakers", "speak", "stop_speaking"]);
    }

    #[test]
    fn descriptor_serializes_input_schema_in_camel_case() {
        let json = serde_json::to_value(&tool_descriptors()[1]).unwrap();
        assert_eq!(json["inputSchema"]["required"], json!(["turns"]));
    }

    #[test]
    fn error_result_sets_is_error_flag() {
        let json = serde_json::to_value(ToolCallResult::error("nope")).unwrap();
        assert_eq!(
            json,
            json!({"content": [{"type": "text", "text": "nope"}], "isError": true})
        );
    }

    #[test]
    fn success_result_omits_is_error() {
        let json = serde_json::to_value(ToolCallResult::text("ok")).unwrap();
        assert!(json.get("isError").is_none());
    }

    #[test]
    fn speak_arguments_accept_dialogue_and_single_turn() {
        let dialogue: SpeakArguments = serde_json::from_value(json!({
            "turns": [{"text": "a"}, {"text": "b", "speaker": 3}]
        }))
        .unwrap();
        assert_eq!(
            dialogue.into_turns(),
            vec![TurnRequest::new("a", None), TurnRequest::new("b", Some(3))]
        );

        let single: SpeakArguments =
            serde_json::from_value(json!({"text": "solo", "speaker": 2})).unwrap();
        assert_eq!(single.into_turns(), vec![TurnRequest::new("solo", Some(2))]);
    }

    #[test]
    fn speak_arguments_reject_other_shapes() {
        assert!(serde_json::from_value::<SpeakArguments>(json!({"turns": "nope"})).is_err());
        assert!(serde_json::from_value::<SpeakArguments>(json!({"speaker": 1})).is_err());
    }
}
