// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Serialization contracts for persisted and API-visible enums.

use crate::{
    AssigneeRef, ConflictType, PeriodStatus, Severity, StaffId, SubcontractorId, SyncState,
    TradeStatus,
};

#[test]
fn test_sync_state_serializes_snake_case() {
    let json = serde_json::to_string(&SyncState::DraftChange).unwrap_or_default();
    assert_eq!(json, "\"draft_change\"");
}

#[test]
fn test_period_status_serializes_screaming_snake_case() {
    let json = serde_json::to_string(&PeriodStatus::Published).unwrap_or_default();
    assert_eq!(json, "\"PUBLISHED\"");
}

#[test]
fn test_trade_status_serializes_snake_case() {
    let json = serde_json::to_string(&TradeStatus::Requested).unwrap_or_default();
    assert_eq!(json, "\"requested\"");
}

#[test]
fn test_conflict_type_and_severity_wire_format() {
    let json = serde_json::to_string(&ConflictType::DoubleBooking).unwrap_or_default();
    assert_eq!(json, "\"double_booking\"");
    let json = serde_json::to_string(&Severity::Blocking).unwrap_or_default();
    assert_eq!(json, "\"blocking\"");
}

#[test]
fn test_assignee_ref_round_trip() {
    for assignee in [
        AssigneeRef::Staff(StaffId::new(7)),
        AssigneeRef::Subcontractor(SubcontractorId::new(12)),
    ] {
        let json = serde_json::to_string(&assignee).unwrap_or_default();
        let parsed: AssigneeRef = match serde_json::from_str(&json) {
            Ok(a) => a,
            Err(e) => panic!("round trip failed for {json}: {e}"),
        };
        assert_eq!(assignee, parsed);
    }
}
