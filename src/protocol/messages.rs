//! Synthesized protocol messages
//!
//! The bridge does not interpret adapter traffic, but it does originate a
//! handful of messages of its own: terminal notifications when a transport
//! closes or errors, and the best-effort shutdown requests sent during
//! disposal. All carry `seq: -1` to mark them as bridge-originated.

/// Event sent to the client when the adapter side of a session goes away
pub fn exited_event(exit_code: i32) -> String {
    serde_json::json!({
        "seq": -1,
        "type": "event",
        "event": "exited",
        "body": {
            "exitCode": exit_code
        }
    })
    .to_string()
}

/// Event sent to the client when the transport reports an error
pub fn error_event(message: &str) -> String {
    serde_json::json!({
        "seq": -1,
        "type": "event",
        "event": "error",
        "body": {
            "message": message
        }
    })
    .to_string()
}

/// Best-effort disconnect request sent to the adapter during disposal
pub fn disconnect_request() -> String {
    serde_json::json!({
        "seq": -1,
        "type": "request",
        "command": "disconnect"
    })
    .to_string()
}

/// Best-effort terminate request sent to the adapter during disposal
pub fn terminate_request() -> String {
    serde_json::json!({
        "seq": -1,
        "type": "request",
        "command": "terminate"
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exited_event_carries_the_code() {
        let event: serde_json::Value = serde_json::from_str(&exited_event(3)).unwrap();
        assert_eq!(event["type"], "event");
        assert_eq!(event["event"], "exited");
        assert_eq!(event["body"]["exitCode"], 3);
        assert_eq!(event["seq"], -1);
    }

    #[test]
    fn shutdown_requests_are_plain_commands() {
        let disconnect: serde_json::Value = serde_json::from_str(&disconnect_request()).unwrap();
        assert_eq!(disconnect["type"], "request");
        assert_eq!(disconnect["command"], "disconnect");

        let terminate: serde_json::Value = serde_json::from_str(&terminate_request()).unwrap();
        assert_eq!(terminate["command"], "terminate");
    }
}
