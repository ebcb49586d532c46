use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use threadline_core::CancelSignal;
use threadline_discord::DiscordApiClient;
use threadline_sync::{
    DispatchOutcome, EventDispatcher, LookupTarget, RawEvent, SyncConfig, SyncError,
    ThreadLookupPolicy,
};

fn dispatcher(server: &MockServer) -> EventDispatcher {
    let client = DiscordApiClient::new(server.base_url(), "bot-token".to_string(), 5_000, 2, 1)
        .expect("discord client");
    let config = SyncConfig {
        guild_id: Some("G1".to_string()),
        thread_lookup: ThreadLookupPolicy {
            max_attempts: 2,
            retry_delay: Duration::from_millis(5),
        },
        ..SyncConfig::new("C1")
    };
    EventDispatcher::new(Arc::new(client), Arc::new(config))
}

fn issue_42(labels: &[&str]) -> Value {
    json!({
        "number": 42,
        "title": "Crash on start",
        "html_url": "https://github.com/acme/widgets/issues/42",
        "state": "open",
        "labels": labels.iter().map(|name| json!({"name": name})).collect::<Vec<_>>(),
        "user": {"login": "octo"}
    })
}

fn active_thread_42(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/guilds/G1/threads/active");
        then.status(200).json_body(json!({
            "threads": [
                {"id": "T4", "parent_id": "C1", "name": "4: Other"},
                {"id": "T420", "parent_id": "C1", "name": "420: Not this one"},
                {"id": "T42", "parent_id": "C1", "name": "42: Crash on start"}
            ]
        }));
    });
}

#[tokio::test]
async fn integration_labeled_issue_posts_status_and_edits_opening() {
    let server = MockServer::start();
    active_thread_42(&server);
    let status = server.mock(|when, then| {
        when.method(POST)
            .path("/channels/T42/messages")
            .body_includes("Issue #42: added urgent label");
        then.status(200)
            .json_body(json!({"id": "1002", "channel_id": "T42", "embeds": []}));
    });
    let history = server.mock(|when, then| {
        when.method(GET)
            .path("/channels/T42/messages")
            .query_param("after", "0");
        then.status(200).json_body(json!([
            {"id": "1002", "channel_id": "T42", "embeds": [{"title": "Issue #42: added urgent label"}]},
            {"id": "1001", "channel_id": "T42", "embeds": [{"title": "Issue opened: #42 Crash on start"}]}
        ]));
    });
    let edit = server.mock(|when, then| {
        when.method(PATCH)
            .path("/channels/T42/messages/1001")
            .body_includes("\"name\":\"Labels\",\"value\":\"bug, urgent\"");
        then.status(200)
            .json_body(json!({"id": "1001", "channel_id": "T42", "embeds": []}));
    });

    let raw = RawEvent::new(
        "issues",
        json!({
            "action": "labeled",
            "issue": issue_42(&["bug", "urgent"]),
            "label": {"name": "urgent"},
            "sender": {"login": "grace"}
        }),
    );
    let outcome = dispatcher(&server)
        .dispatch_event(&raw, &CancelSignal::never())
        .await
        .expect("labeled");

    assert_eq!(
        outcome,
        DispatchOutcome::StatusPosted {
            thread_id: "T42".to_string(),
            message_id: "1002".to_string(),
            opening_refreshed: true,
        }
    );
    status.assert_calls(1);
    history.assert_calls(1);
    edit.assert_calls(1);
}

#[tokio::test]
async fn integration_duplicate_opened_never_starts_a_thread() {
    let server = MockServer::start();
    active_thread_42(&server);
    let start = server.mock(|when, then| {
        when.method(POST).path("/channels/C1/threads");
        then.status(201)
            .json_body(json!({"id": "T99", "parent_id": "C1", "name": "42: Crash on start"}));
    });

    let raw = RawEvent::new("issues", json!({"action": "opened", "issue": issue_42(&[])}));
    let error = dispatcher(&server)
        .dispatch_event(&raw, &CancelSignal::never())
        .await
        .expect_err("duplicate");

    assert!(matches!(error, SyncError::AlreadyExists { ref thread_id, .. } if thread_id == "T42"));
    start.assert_calls(0);
}

#[tokio::test]
async fn integration_archived_threads_are_paged_by_timestamp() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/guilds/G1/threads/active");
        then.status(200).json_body(json!({"threads": []}));
    });
    let first_page = server.mock(|when, then| {
        when.method(GET)
            .path("/channels/C1/threads/archived/public")
            .query_param("limit", "100")
            .query_param_missing("before");
        then.status(200).json_body(json!({
            "threads": [
                {"id": "T50", "parent_id": "C1", "name": "50: Newer",
                 "thread_metadata": {"archived": true, "archive_timestamp": "2024-05-02T00:00:00+00:00"}},
                {"id": "T43", "parent_id": "C1", "name": "43: Newer",
                 "thread_metadata": {"archived": true, "archive_timestamp": "2024-05-01T00:00:00+00:00"}}
            ],
            "has_more": true
        }));
    });
    let second_page = server.mock(|when, then| {
        when.method(GET)
            .path("/channels/C1/threads/archived/public")
            .query_param("before", "2024-05-01T00:00:00+00:00");
        then.status(200).json_body(json!({
            "threads": [
                {"id": "T42", "parent_id": "C1", "name": "42: Crash on start",
                 "thread_metadata": {"archived": true, "archive_timestamp": "2024-04-01T00:00:00+00:00"}}
            ],
            "has_more": false
        }));
    });
    let status = server.mock(|when, then| {
        when.method(POST).path("/channels/T42/messages");
        then.status(200)
            .json_body(json!({"id": "2001", "channel_id": "T42", "embeds": []}));
    });

    let raw = RawEvent::new(
        "issues",
        json!({"action": "transferred", "issue": issue_42(&[]), "sender": {"login": "grace"}}),
    );
    let outcome = dispatcher(&server)
        .dispatch_event(&raw, &CancelSignal::never())
        .await
        .expect("transferred");

    assert!(matches!(
        outcome,
        DispatchOutcome::StatusPosted {
            opening_refreshed: false,
            ..
        }
    ));
    first_page.assert_calls(1);
    second_page.assert_calls(1);
    status.assert_calls(1);
}

#[tokio::test]
async fn integration_comment_edit_targets_message_with_matching_footer() {
    let server = MockServer::start();
    active_thread_42(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path("/channels/T42/messages")
            .query_param_missing("after")
            .query_param_missing("before");
        then.status(200).json_body(json!([
            {"id": "3003", "channel_id": "T42", "embeds": [{"title": "Comment on issue #42", "footer": {"text": "5550"}}]},
            {"id": "3002", "channel_id": "T42", "embeds": [
                {"title": "Comment on issue #42", "footer": {"text": "555"}},
                {"title": "extra"}
            ]},
            {"id": "3001", "channel_id": "T42", "embeds": [{"title": "Comment on issue #42", "footer": {"text": "555"}}]}
        ]));
    });
    let edit = server.mock(|when, then| {
        when.method(PATCH)
            .path("/channels/T42/messages/3001")
            .body_includes("edited body");
        then.status(200)
            .json_body(json!({"id": "3001", "channel_id": "T42", "embeds": []}));
    });

    let raw = RawEvent::new(
        "issue_comment",
        json!({
            "action": "edited",
            "issue": issue_42(&[]),
            "comment": {"id": 555, "body": "edited body", "user": {"login": "ada"}}
        }),
    );
    let outcome = dispatcher(&server)
        .dispatch_event(&raw, &CancelSignal::never())
        .await
        .expect("edited");

    assert_eq!(
        outcome,
        DispatchOutcome::ReplyEdited {
            thread_id: "T42".to_string(),
            message_id: "3001".to_string(),
            correlation_id: 555,
        }
    );
    edit.assert_calls(1);
}

#[tokio::test]
async fn integration_missing_thread_reports_not_found_after_retries() {
    let server = MockServer::start();
    let active = server.mock(|when, then| {
        when.method(GET).path("/guilds/G1/threads/active");
        then.status(200).json_body(json!({"threads": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/channels/C1/threads/archived/public");
        then.status(200)
            .json_body(json!({"threads": [], "has_more": false}));
    });

    let raw = RawEvent::new("issues", json!({"action": "closed", "issue": issue_42(&[])}));
    let error = dispatcher(&server)
        .dispatch_event(&raw, &CancelSignal::never())
        .await
        .expect_err("missing thread");

    assert!(matches!(
        error,
        SyncError::NotFound {
            target: LookupTarget::Thread,
            ..
        }
    ));
    active.assert_calls(2);
}
