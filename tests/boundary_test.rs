use spec_ledger::boundary::BoundaryWarning;
use spec_ledger::ui;

// ============================================================================
// BoundaryWarning Display Tests
// ============================================================================

#[test]
fn test_boundary_warning_detached_head_display() {
    let warning = BoundaryWarning::DetachedHead {
        tag: "v2.0.0".to_string(),
        commit_hash: "abc1234def5678".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("detached HEAD"),
        "Message should mention detached HEAD, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("v2.0.0"),
        "Message should contain tag 'v2.0.0', got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("abc1234") && !display_msg.contains("abc1234d"),
        "Message should contain shortened commit hash 'abc1234', got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_vcs_unavailable_display() {
    let warning = BoundaryWarning::VcsUnavailable {
        reason: "Not a git repository: /tmp/x".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("Git is unavailable"),
        "Message should say git is unavailable, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("/tmp/x"),
        "Message should carry the reason, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_partial_bump_display() {
    let warning = BoundaryWarning::PartialBump {
        version: "1.3.0".to_string(),
        detail: "Tag v1.3.0 already exists".to_string(),
    };

    let display_msg = warning.to_string();
    assert!(
        display_msg.contains("1.3.0") && display_msg.contains("partially applied"),
        "Message should name the version and partial state, got: {}",
        display_msg
    );
    assert!(
        display_msg.contains("already exists"),
        "Message should carry the failure detail, got: {}",
        display_msg
    );
}

#[test]
fn test_boundary_warning_drift_display() {
    let found = BoundaryWarning::DocumentVersionDrift {
        tag: "v1.0.0".to_string(),
        expected: "1.0.0".to_string(),
        found: Some("0.9.0".to_string()),
    };
    assert!(found.to_string().contains("declares version 0.9.0 instead of 1.0.0"));

    let missing = BoundaryWarning::DocumentVersionDrift {
        tag: "v1.0.0".to_string(),
        expected: "1.0.0".to_string(),
        found: None,
    };
    assert!(missing.to_string().contains("no readable version"));
}

#[test]
fn test_boundary_warning_discarded_changes_display() {
    assert_eq!(
        BoundaryWarning::DiscardedChanges.to_string(),
        "Uncommitted changes were discarded"
    );
}

#[test]
fn test_boundary_warnings_are_comparable() {
    let a = BoundaryWarning::DiscardedChanges;
    let b = BoundaryWarning::DiscardedChanges;
    assert_eq!(a, b);
    assert_ne!(
        a,
        BoundaryWarning::VcsUnavailable {
            reason: "x".to_string()
        }
    );
}

// ============================================================================
// UI Display Function Tests
// ============================================================================

#[test]
fn test_display_boundary_warning_does_not_panic() {
    let warning = BoundaryWarning::DetachedHead {
        tag: "v1.0.0".to_string(),
        commit_hash: "abc".to_string(),
    };
    ui::display_boundary_warning(&warning);
}

#[test]
fn test_display_tag_hint_does_not_panic() {
    ui::display_tag_hint(&[]);
    ui::display_tag_hint(&["v1.1.0".to_string(), "v1.0.0".to_string()]);
}
