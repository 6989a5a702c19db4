use tabweave::types::errors::*;

// === GatewayError Tests ===

#[test]
fn gateway_error_not_found_display() {
    let err = GatewayError::NotFound("tab-123".to_string());
    assert_eq!(err.to_string(), "Tab not found: tab-123");
}

#[test]
fn gateway_error_rejected_display() {
    let err = GatewayError::rejected("freeze_tab", "tab is active");
    assert_eq!(err.to_string(), "Operation freeze_tab rejected: tab is active");
}

#[test]
fn gateway_error_transport_display() {
    let err = GatewayError::Transport("socket closed".to_string());
    assert_eq!(err.to_string(), "Gateway transport error: socket closed");
}

#[test]
fn gateway_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(GatewayError::NotFound("id".to_string()));
    assert!(err.source().is_none());
}

// === SurfaceError Tests ===

#[test]
fn surface_error_display_variants() {
    assert_eq!(
        SurfaceError::CreateFailed {
            tab_id: "t1".into(),
            reason: "no gpu".into()
        }
        .to_string(),
        "Failed to create surface for tab t1: no gpu"
    );
    assert_eq!(
        SurfaceError::ShowFailed {
            tab_id: "t1".into(),
            reason: "hidden".into()
        }
        .to_string(),
        "Failed to show surface for tab t1: hidden"
    );
    assert_eq!(
        SurfaceError::NavigateFailed {
            tab_id: "t1".into(),
            reason: "blocked".into()
        }
        .to_string(),
        "Navigation failed for tab t1: blocked"
    );
    assert_eq!(
        SurfaceError::NotBound("t2".into()).to_string(),
        "No surface bound for tab: t2"
    );
    assert_eq!(
        SurfaceError::InvalidUrl("::".into()).to_string(),
        "Invalid URL: ::"
    );
    assert_eq!(
        SurfaceError::Host("gone".into()).to_string(),
        "Surface host error: gone"
    );
}

// === ConfigError Tests ===

#[test]
fn config_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: ConfigError = io.into();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().starts_with("Settings I/O error"));
}

#[test]
fn config_error_from_serde() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
    let err: ConfigError = serde_err.into();
    assert!(matches!(err, ConfigError::Serialization(_)));
}

#[test]
fn config_error_invalid_key_display() {
    let err = ConfigError::InvalidKey("nope.nothing".to_string());
    assert_eq!(err.to_string(), "Invalid settings key: nope.nothing");
}

// === CoordinatorError Tests ===

#[test]
fn coordinator_error_is_transparent_over_sources() {
    let err: CoordinatorError = GatewayError::NotFound("t9".into()).into();
    assert_eq!(err.to_string(), "Tab not found: t9");

    let err: CoordinatorError = SurfaceError::NotBound("t9".into()).into();
    assert_eq!(err.to_string(), "No surface bound for tab: t9");
}

#[test]
fn coordinator_error_classes() {
    let cases = [
        (
            CoordinatorError::from(SurfaceError::Host("x".into())),
            ErrorClass::TransientIo,
        ),
        (
            CoordinatorError::from(GatewayError::Transport("x".into())),
            ErrorClass::TransientIo,
        ),
        (
            CoordinatorError::from(GatewayError::NotFound("x".into())),
            ErrorClass::StateDesync,
        ),
        (
            CoordinatorError::from(GatewayError::rejected("op", "no")),
            ErrorClass::OperationRejected,
        ),
        (CoordinatorError::NoActiveTab, ErrorClass::StateDesync),
        (CoordinatorError::NoDragInProgress, ErrorClass::StateDesync),
        (
            CoordinatorError::UnknownNotification("n".into()),
            ErrorClass::StateDesync,
        ),
        (CoordinatorError::Stopped, ErrorClass::OperationRejected),
    ];
    for (err, class) in cases {
        assert_eq!(err.class(), class, "{}", err);
    }
}

#[test]
fn only_transient_failures_are_retryable() {
    assert!(CoordinatorError::from(SurfaceError::NotBound("t".into())).is_retryable());
    assert!(!CoordinatorError::from(GatewayError::rejected("op", "no")).is_retryable());
    assert!(!CoordinatorError::NoActiveTab.is_retryable());
}

#[test]
fn error_class_serializes_kebab_case() {
    let json = serde_json::to_string(&ErrorClass::TransientIo).unwrap();
    assert_eq!(json, "\"transient-io\"");
    let json = serde_json::to_string(&ErrorClass::OperationRejected).unwrap();
    assert_eq!(json, "\"operation-rejected\"");
}
