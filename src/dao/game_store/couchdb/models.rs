use serde::{Deserialize, Serialize};

use crate::state::{lobby::LobbyCode, snapshot::Snapshot};

/// Id prefix shared by every session document.
pub const SESSION_PREFIX: &str = "session::";

/// One session document per lobby code; the body is the snapshot itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSessionDocument {
    /// Document id, `session::<CODE>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// CouchDB revision; required to overwrite.
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Replicated session state.
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

impl CouchSessionDocument {
    /// Wrap a snapshot for the lobby `code`.
    pub fn new(code: &LobbyCode, snapshot: Snapshot, rev: Option<String>) -> Self {
        Self {
            id: session_doc_id(code),
            rev,
            snapshot,
        }
    }
}

/// Document id of the lobby `code`.
pub fn session_doc_id(code: &LobbyCode) -> String {
    format!("{}{}", SESSION_PREFIX, code)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::{snapshot::ParticipantSnapshot, state_machine::GamePhase};

    #[test]
    fn document_round_trips_through_couch_layout() {
        let code = LobbyCode::parse("ab12cd").unwrap();
        let snapshot = Snapshot {
            lobby_code: code.to_string(),
            phase: GamePhase::Break,
            round: 2,
            total_rounds: 3,
            timer: 12,
            participants: vec![ParticipantSnapshot {
                id: 4,
                name: "Grace".into(),
                score: 9,
                joined_at: SystemTime::UNIX_EPOCH,
                tasks: Vec::new(),
            }],
        };

        let doc = CouchSessionDocument::new(&code, snapshot.clone(), Some("1-abc".into()));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "session::AB12CD");
        assert_eq!(value["_rev"], "1-abc");
        assert_eq!(value["phase"], "break");

        let parsed: CouchSessionDocument = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.snapshot, snapshot);
    }

    #[test]
    fn new_documents_omit_revision() {
        let code = LobbyCode::parse("ZZ99ZZ").unwrap();
        let snapshot = Snapshot {
            lobby_code: code.to_string(),
            phase: GamePhase::Setup,
            round: 1,
            total_rounds: 1,
            timer: 0,
            participants: Vec::new(),
        };
        let value = serde_json::to_value(CouchSessionDocument::new(&code, snapshot, None)).unwrap();
        assert!(value.get("_rev").is_none());
    }
}
