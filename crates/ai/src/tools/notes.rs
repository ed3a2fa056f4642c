//! Note tool - append a timestamped note, optionally tied to a holding.

use chrono::Utc;
use folio_core::portfolio::NewNote;
use rig::{completion::ToolDefinition, tool::Tool};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::common::{core_err, resolve_holding};
use super::constants::{ADD_NOTE, MAX_NOTE_CHARS, SRC_INSERT_NOTE};
use super::holding_detail::NoteDto;
use super::invocation::{Traced, ValidateArgs};
use crate::env::AiEnvironment;
use crate::error::AiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddNoteArgs {
    pub content: String,
    #[serde(default)]
    pub holding_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ValidateArgs for AddNoteArgs {
    fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("content must not be empty".to_string());
        }
        if self.content.chars().count() > MAX_NOTE_CHARS {
            return Err(format!("content must be at most {} characters", MAX_NOTE_CHARS));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteOutput {
    pub note: NoteDto,
    pub symbol: Option<String>,
}

pub struct AddNoteTool<E: AiEnvironment> {
    env: Arc<E>,
}

impl<E: AiEnvironment> AddNoteTool<E> {
    pub fn new(env: Arc<E>) -> Self {
        Self { env }
    }
}

impl<E: AiEnvironment + 'static> Tool for AddNoteTool<E> {
    const NAME: &'static str = ADD_NOTE;

    type Error = AiError;
    type Args = AddNoteArgs;
    type Output = Traced<AddNoteOutput>;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Save a note for the user. Attach it to a holding with holdingId or symbol, or leave both out for a general portfolio note. Only call this when the user asks to write something down.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "content": { "type": "string", "maxLength": MAX_NOTE_CHARS },
                    "holdingId": { "type": "string" },
                    "symbol": { "type": "string" },
                    "tags": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["content"],
                "additionalProperties": false
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let repo = self.env.portfolio_repository();
        let mut provenance = Vec::new();

        let holding = if args.holding_id.is_some() || args.symbol.is_some() {
            Some(resolve_holding(
                repo.as_ref(),
                args.holding_id.as_deref(),
                args.symbol.as_deref(),
                &mut provenance,
            )?)
        } else {
            None
        };

        let tags = args
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let note = repo
            .insert_note(NewNote {
                holding_id: holding.as_ref().map(|h| h.id.clone()),
                content: args.content.trim().to_string(),
                tags,
                created_at: Utc::now(),
            })
            .await
            .map_err(core_err)?;
        provenance.push(SRC_INSERT_NOTE.to_string());

        Ok(Traced::new(
            AddNoteOutput {
                note: NoteDto::from(note),
                symbol: holding.map(|h| h.symbol),
            },
            provenance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_env::{holding, MockEnvironment};
    use folio_core::portfolio::HoldingType;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_add_note_for_symbol() {
        let env = Arc::new(MockEnvironment::new().with_holdings(vec![holding(
            "h1",
            "TSLA",
            HoldingType::Stock,
            dec!(1),
            dec!(200),
        )]));
        let tool = AddNoteTool::new(env.clone());

        let output = tool
            .call(AddNoteArgs {
                content: "  Revisit after earnings ".to_string(),
                holding_id: None,
                symbol: Some("tsla".to_string()),
                tags: vec!["earnings".to_string(), " ".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(output.data.note.content, "Revisit after earnings");
        assert_eq!(output.data.note.holding_id.as_deref(), Some("h1"));
        assert_eq!(output.data.note.tags, vec!["earnings"]);
        assert_eq!(
            output.data_provenance,
            vec!["repository.list_holdings", "repository.insert_note"]
        );
        assert_eq!(env.portfolio.notes.read().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_general_note() {
        let env = Arc::new(MockEnvironment::new());
        let tool = AddNoteTool::new(env);
        let output = tool
            .call(AddNoteArgs {
                content: "Rebalance in January".to_string(),
                holding_id: None,
                symbol: None,
                tags: vec![],
            })
            .await
            .unwrap();
        assert!(output.data.note.holding_id.is_none());
        assert_eq!(output.data_provenance, vec!["repository.insert_note"]);
    }

    #[test]
    fn test_blank_content_rejected() {
        let args = AddNoteArgs {
            content: "   ".to_string(),
            holding_id: None,
            symbol: None,
            tags: vec![],
        };
        assert!(args.validate().is_err());
    }
}
