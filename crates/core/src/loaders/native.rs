//! The board's own JSON shape: a serialized [`LaneData`].

use crate::model::LaneData;

use super::LoadError;

/// A lane with no records is valid and renders as an empty shell.
pub fn parse_lane_json(data: &[u8]) -> Result<LaneData, LoadError> {
    let lane: LaneData = serde_json::from_slice(data)?;
    unique_uuids(lane)
}

pub fn lane_from_value(value: serde_json::Value) -> Result<LaneData, LoadError> {
    let lane: LaneData = serde_json::from_value(value)?;
    unique_uuids(lane)
}

fn unique_uuids(lane: LaneData) -> Result<LaneData, LoadError> {
    if let Some(uuid) = lane.duplicate_uuid() {
        return Err(LoadError::DuplicateUuid {
            session: lane.id().to_string(),
            uuid: uuid.to_string(),
        });
    }
    Ok(lane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InteractionRecord, Role, Session};
    use crate::{Board, BoardConfig, Lane};
    use lanewise_protocol::{HitTarget, RenderCommand, Viewport};

    #[test]
    fn reads_serialized_lane() {
        let lane = LaneData::new(
            Session::new("s1", "Refactor"),
            vec![
                InteractionRecord::new("a", Role::User).with_text("go"),
                InteractionRecord::new("b", Role::Assistant)
                    .with_parent("a")
                    .with_usage(10, 2),
            ],
        );
        let json = serde_json::to_vec(&lane).unwrap();
        let back = parse_lane_json(&json).unwrap();
        assert_eq!(back.session, lane.session);
        assert_eq!(&*back.records, &*lane.records);
    }

    #[test]
    fn unknown_roles_and_missing_fields_degrade() {
        let json = br#"{"session":{"id":"s"},"records":[{"uuid":"x","role":"tool"},{"uuid":"y"}]}"#;
        let lane = parse_lane_json(json).unwrap();
        assert!(lane.records.iter().all(|r| r.role == Role::Unknown));
        assert_eq!(lane.session.title, "");
    }

    #[test]
    fn empty_lane_loads_with_zero_stats() {
        let lane = lane_from_value(serde_json::json!({
            "session": {"id": "e", "title": "empty"},
            "records": []
        }))
        .unwrap();
        assert!(lane.records.is_empty());

        let mut board = Board::new(BoardConfig::default());
        board.set_sessions(vec![lane]);
        assert_eq!(board.visible_lanes(), &["e"]);
        let stats = board.lane("e").map(Lane::stats).unwrap();
        assert_eq!(stats.total_tokens, 0);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.record_count, 0);
        let commands = board.render(&Viewport::new(400.0, 300.0));
        assert!(!board.is_failed());
        assert!(commands.iter().any(|c| matches!(
            c,
            RenderCommand::DrawRect { target: Some(HitTarget::LaneHeader { lane_id }), .. } if lane_id == "e"
        )));
    }

    #[test]
    fn repeated_uuid_is_rejected() {
        let json = br#"{"session":{"id":"s"},"records":[{"uuid":"x"},{"uuid":"y"},{"uuid":"x"}]}"#;
        assert!(matches!(
            parse_lane_json(json),
            Err(LoadError::DuplicateUuid { session, uuid }) if session == "s" && uuid == "x"
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(parse_lane_json(b"{"), Err(LoadError::Json(_))));
    }
}
