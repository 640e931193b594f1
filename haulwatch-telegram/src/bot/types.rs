use serde::{Deserialize, Serialize};

/// Every Bot API response wraps its payload in this envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Entity offsets/lengths are in UTF-16 code units, per the Bot API.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: &str, description: &str) -> Self {
        Self {
            command: command.to_string(),
            description: description.to_string(),
        }
    }
}

impl Message {
    /// The first URL carried by this message, honouring UTF-16 entity
    /// offsets. `text_link` entities carry the URL directly.
    pub fn first_url(&self) -> Option<String> {
        let text = self.text.as_deref()?;
        for entity in &self.entities {
            match entity.kind.as_str() {
                "url" => {
                    if let Some(slice) = utf16_slice(text, entity.offset, entity.length) {
                        return Some(slice);
                    }
                }
                "text_link" => {
                    if let Some(url) = &entity.url {
                        return Some(url.clone());
                    }
                }
                _ => {}
            }
        }
        None
    }
}

fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    if end > units.len() {
        return None;
    }
    String::from_utf16(&units[offset..end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(json: &str) -> Message {
        serde_json::from_str(json).expect("message parses")
    }

    #[test]
    fn update_envelope_deserializes() {
        let env: ApiEnvelope<Vec<Update>> = serde_json::from_str(
            r#"{"ok":true,"result":[{"update_id":10,"message":{
                "message_id":5,"from":{"id":42},"chat":{"id":42},
                "text":"/status","entities":[{"type":"bot_command","offset":0,"length":7}]
            }}]}"#,
        )
        .unwrap();
        assert!(env.ok);
        let updates = env.result.unwrap();
        assert_eq!(updates[0].update_id, 10);
        assert_eq!(
            updates[0].message.as_ref().unwrap().text.as_deref(),
            Some("/status")
        );
    }

    #[test]
    fn first_url_honours_utf16_offsets() {
        // The Cyrillic prefix is 2 UTF-16 units per char; byte slicing would
        // land mid-character.
        let msg = message(
            r#"{"message_id":1,"chat":{"id":1},
                "text":"гляди https://loads.ati.su/x",
                "entities":[{"type":"url","offset":6,"length":22}]}"#,
        );
        assert_eq!(msg.first_url().as_deref(), Some("https://loads.ati.su/x"));
    }

    #[test]
    fn first_url_reads_text_links() {
        let msg = message(
            r#"{"message_id":1,"chat":{"id":1},
                "text":"тут",
                "entities":[{"type":"text_link","offset":0,"length":3,"url":"https://loads.ati.su/y"}]}"#,
        );
        assert_eq!(msg.first_url().as_deref(), Some("https://loads.ati.su/y"));
    }

    #[test]
    fn first_url_is_none_without_entities() {
        let msg = message(r#"{"message_id":1,"chat":{"id":1},"text":"hello"}"#);
        assert!(msg.first_url().is_none());
    }

    #[test]
    fn out_of_range_entity_is_ignored() {
        let msg = message(
            r#"{"message_id":1,"chat":{"id":1},
                "text":"abc",
                "entities":[{"type":"url","offset":2,"length":10}]}"#,
        );
        assert!(msg.first_url().is_none());
    }
}
