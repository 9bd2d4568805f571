use std::{sync::Arc, time::Duration};

use httpmock::prelude::*;
use quire::{
    application::{
        admin::access::AccessService,
        repos::Credentials,
        resource::{Confirmation, DeleteOutcome, SubmitOutcome},
        session::{Session, SessionStore},
        toasts::Notices,
    },
    domain::session::SessionUser,
    infra::api::BlogApiClient,
};
use reqwest::{Client, Url};

fn access_for(server: &MockServer) -> AccessService {
    let base = Url::parse(&server.url("/api")).expect("mock url");
    let client = Arc::new(BlogApiClient::with_client(Client::new(), base));
    AccessService::new(client.clone(), client)
}

fn admin_session() -> Arc<Session> {
    let store = SessionStore::new(Duration::from_secs(600));
    store.create(
        SessionUser {
            id: "u1".to_string(),
            name: None,
            email: "root@example.com".to_string(),
            role_name: Some("admin".to_string()),
        },
        Credentials::bearer("admin-token"),
    )
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[tokio::test]
async fn lowercase_permission_keys_never_reach_the_api() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/permissions");
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"id":"p1","name":"read_user"}"#);
        })
        .await;

    let access = access_for(&server);
    let session = admin_session();
    let notices = Notices::new();
    let manager = access.permissions_manager(&session, &notices);
    let mut modal = manager.open_create().expect("create form");

    let outcome = manager
        .submit(&mut modal, &pairs(&[("name", "read_user")]))
        .await;

    assert!(matches!(outcome, SubmitOutcome::Invalid));
    assert!(modal.errors().contains_key("name"));
    assert_eq!(create.hits_async().await, 0);
    assert!(session.collections().permissions.is_empty());
}

#[tokio::test]
async fn created_permissions_join_the_table() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/permissions")
                .header("authorization", "Bearer admin-token");
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"data":{"id":7,"name":"READ_USER","description":"Read users"}}"#);
        })
        .await;

    let access = access_for(&server);
    let session = admin_session();
    let notices = Notices::new();
    let permissions = &session.collections().permissions;
    let ticket = permissions.begin_load();
    assert!(permissions.finish_load(ticket, Vec::new()));
    let manager = access.permissions_manager(&session, &notices);
    let mut modal = manager.open_create().expect("create form");

    let outcome = manager
        .submit(
            &mut modal,
            &pairs(&[("name", "READ_USER"), ("description", "Read users")]),
        )
        .await;

    assert!(matches!(outcome, SubmitOutcome::Saved));
    create.assert_async().await;
    let stored = session
        .collections()
        .permissions
        .find("7")
        .expect("permission stored");
    assert_eq!(stored.name, "READ_USER");

    let table = manager.table_view();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].id, "7");
}

#[tokio::test]
async fn rejected_creates_keep_the_form_open_with_a_notice() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/roles");
            then.status(409)
                .header("content-type", "application/json")
                .body(r#"{"message":"Role already exists"}"#);
        })
        .await;

    let access = access_for(&server);
    let session = admin_session();
    let notices = Notices::new();
    let manager = access.roles_manager(&session, &notices);
    let mut modal = manager.open_create().expect("create form");

    let outcome = manager
        .submit(&mut modal, &pairs(&[("name", "auditor")]))
        .await;

    assert!(!outcome.closes_modal());
    let raised = notices.drain();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].lines, vec!["Role already exists"]);
    assert!(session.collections().roles.is_empty());
}

#[tokio::test]
async fn deletes_ask_first_then_remove_the_row() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/permissions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"id":"p1","name":"READ_USER"},{"id":"p2","name":"CREATE_POST"}]"#);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/roles");
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/permissions/p1");
            then.status(204);
        })
        .await;

    let access = access_for(&server);
    let session = admin_session();
    let notices = Notices::new();
    access.load(&session, &notices).await;
    assert_eq!(session.collections().permissions.len(), 2);

    let manager = access.permissions_manager(&session, &notices);
    let first = manager
        .delete("p1", Confirmation::Pending)
        .await
        .expect("delete offered");
    assert!(matches!(first, Ok(DeleteOutcome::ConfirmationRequired(_))));
    assert_eq!(delete.hits_async().await, 0);

    let second = manager
        .delete("p1", Confirmation::Confirmed)
        .await
        .expect("delete offered");
    assert!(matches!(second, Ok(DeleteOutcome::Deleted)));
    delete.assert_async().await;
    assert!(session.collections().permissions.find("p1").is_none());
    assert_eq!(session.collections().permissions.len(), 1);
}

#[tokio::test]
async fn unloaded_tables_report_loading_without_rows() {
    let server = MockServer::start_async().await;
    let access = access_for(&server);
    let session = admin_session();
    let notices = Notices::new();
    session.collections().roles.apply_created(quire_api_types::Role {
        id: "r1".to_string(),
        name: "auditor".to_string(),
        description: None,
        permissions: None,
    });

    let table = access.roles_manager(&session, &notices).table_view();

    assert!(table.is_loading);
    assert!(table.rows.is_empty());
}
