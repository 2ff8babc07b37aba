use barista_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GenerateContentChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
    // Thinking models interleave thought summaries with answer text.
    #[serde(default)]
    pub thought: bool,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    thinking_config: ThinkingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

// -----------
// Conversions
// -----------

/// Builds the wire request from an abstract model request.
///
/// System messages merge into the `systemInstruction` field. The other
/// messages keep their relative order; consecutive same-role messages
/// are merged into one content entry, since the API requires strictly
/// alternating user/model turns.
#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    let mut system_instruction: Option<String> = None;
    let mut contents: Vec<Content> = Vec::new();

    for msg in &req.messages {
        let role = match msg {
            ModelMessage::System(text) => {
                match &mut system_instruction {
                    Some(existing) => {
                        existing.push_str("\n\n");
                        existing.push_str(text);
                    }
                    None => system_instruction = Some(text.clone()),
                }
                continue;
            }
            ModelMessage::User(_) => "user",
            ModelMessage::Model(_) => "model",
        };

        let part = Part {
            text: msg.content().to_owned(),
        };
        match contents.last_mut() {
            Some(last) if last.role == Some(role) => last.parts.push(part),
            _ => contents.push(Content {
                role: Some(role),
                parts: vec![part],
            }),
        }
    }

    GenerateContentRequest {
        contents,
        system_instruction: system_instruction.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        }),
        generation_config: GenerationConfig {
            response_mime_type: "text/plain",
            thinking_config: ThinkingConfig {
                thinking_budget: -1,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System(
                    "You are a friendly coffee chat partner.".to_owned(),
                ),
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::Model("Hello! Grab a seat.".to_owned()),
                ModelMessage::User("Tell me about yourself".to_owned()),
            ],
        };
        let expected = GenerateContentRequest {
            contents: vec![
                Content {
                    role: Some("user"),
                    parts: vec![Part {
                        text: "Hi".to_owned(),
                    }],
                },
                Content {
                    role: Some("model"),
                    parts: vec![Part {
                        text: "Hello! Grab a seat.".to_owned(),
                    }],
                },
                Content {
                    role: Some("user"),
                    parts: vec![Part {
                        text: "Tell me about yourself".to_owned(),
                    }],
                },
            ],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: "You are a friendly coffee chat partner.".to_owned(),
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "text/plain",
                thinking_config: ThinkingConfig {
                    thinking_budget: -1,
                },
            },
        };
        assert_eq!(create_request(&request), expected);
    }

    #[test]
    fn test_merges_consecutive_roles() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::User("Hi".to_owned()),
                ModelMessage::User("Are you there?".to_owned()),
            ],
        };
        let wire = create_request(&request);
        assert_eq!(wire.contents.len(), 1);
        assert_eq!(wire.contents[0].parts.len(), 2);
    }

    #[test]
    fn test_serialized_field_names() {
        let request = ModelRequest {
            messages: vec![
                ModelMessage::System("Stay in character.".to_owned()),
                ModelMessage::User("Hi".to_owned()),
            ],
        };
        let json =
            serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "Stay in character."
        );
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "text/plain"
        );
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            -1
        );
    }
}
