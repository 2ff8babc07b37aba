/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, in dialogue order.
    pub messages: Vec<ModelMessage>,
}

/// A complete message.
///
/// The relative order of messages in a request reconstructs the
/// dialogue order for the provider, so implementors must submit them
/// exactly as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions steering the model's persona.
    System(String),
    /// A user input text.
    User(String),
    /// A previously generated model answer.
    Model(String),
}

impl ModelMessage {
    /// Returns the text content of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System(text)
            | ModelMessage::User(text)
            | ModelMessage::Model(text) => text,
        }
    }
}
