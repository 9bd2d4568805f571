use bytes::Bytes;
use httpmock::prelude::*;
use quire::{
    application::repos::{
        Credentials, ImagesRepo, PermissionsRepo, RepoError, RolesRepo, UsersRepo,
    },
    domain::content::PendingImage,
    infra::api::BlogApiClient,
};
use quire_api_types::{PermissionPayload, RolePayload};
use reqwest::{Client, Url};

fn client_for(server: &MockServer) -> BlogApiClient {
    let base = Url::parse(&server.url("/api")).expect("mock url");
    BlogApiClient::with_client(Client::new(), base)
}

#[tokio::test]
async fn lists_decode_with_or_without_an_envelope() {
    let server = MockServer::start_async().await;
    let roles = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/roles")
                .header("authorization", "Bearer t-123");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"data":[{"id":1,"name":"admin","permissions":[]}]}"#);
        })
        .await;
    let permissions = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/permissions");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"[{"id":"p1","name":"READ_USER","description":"Read users"}]"#);
        })
        .await;

    let client = client_for(&server);
    let auth = Credentials::bearer("t-123");

    let listed = client.list_roles(&auth).await.expect("roles");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "1");
    assert_eq!(listed[0].name, "admin");

    let listed = client.list_permissions(&auth).await.expect("permissions");
    assert_eq!(listed[0].name, "READ_USER");
    assert_eq!(listed[0].description.as_deref(), Some("Read users"));

    roles.assert_async().await;
    permissions.assert_async().await;
}

#[tokio::test]
async fn error_arrays_become_toast_lines() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/roles");
            then.status(400)
                .header("content-type", "application/json")
                .body(r#"{"errors":[{"msg":"Name is required"},{"message":"Name is too short"}]}"#);
        })
        .await;

    let client = client_for(&server);
    let payload = RolePayload {
        name: Some(String::new()),
        description: None,
        permissions: None,
    };
    let err = client
        .create_role(&Credentials::bearer("t"), &payload)
        .await
        .expect_err("rejected");

    match err {
        RepoError::Rejected { status, messages } => {
            assert_eq!(status, 400);
            assert_eq!(messages, vec!["Name is required", "Name is too short"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn error_objects_map_to_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/permissions/p1");
            then.status(422)
                .header("content-type", "application/json")
                .body(r#"{"errors":{"name":"Permission already exists"}}"#);
        })
        .await;

    let client = client_for(&server);
    let payload = PermissionPayload {
        name: Some("READ_USER".to_string()),
        description: None,
    };
    let err = client
        .update_permission(&Credentials::bearer("t"), "p1", &payload)
        .await
        .expect_err("rejected");

    let fields = err.field_errors().expect("field errors");
    assert_eq!(
        fields.get("name").map(String::as_str),
        Some("Permission already exists")
    );
}

#[tokio::test]
async fn bare_statuses_classify_without_a_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/users");
            then.status(401);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/roles/gone");
            then.status(404);
        })
        .await;

    let client = client_for(&server);
    let auth = Credentials::bearer("expired");

    assert!(matches!(
        client.list_users(&auth).await,
        Err(RepoError::Unauthorized)
    ));
    assert!(matches!(
        client.delete_role(&auth, "gone").await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let base = Url::parse("http://127.0.0.1:9/api").expect("url");
    let client = BlogApiClient::with_client(Client::new(), base);

    let err = client
        .list_roles(&Credentials::anonymous())
        .await
        .expect_err("no server");
    assert!(matches!(err, RepoError::Transport(_)));
    assert_eq!(err.toast_messages(), vec!["An unexpected error occurred"]);
}

#[tokio::test]
async fn images_upload_as_multipart_and_return_their_id() {
    let server = MockServer::start_async().await;
    let upload = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/images")
                .header("authorization", "Bearer t");
            then.status(201)
                .header("content-type", "application/json")
                .body(r#"{"data":{"imageId":42}}"#);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/images/old-1");
            then.status(204);
        })
        .await;

    let client = client_for(&server);
    let auth = Credentials::bearer("t");
    let image = PendingImage::new("cat.png", "image/png", Bytes::from_static(b"\x89PNG"));

    let id = client
        .upload_post_image(&auth, "post-9", &image)
        .await
        .expect("uploaded");
    assert_eq!(id, "42");
    client.delete_image(&auth, "old-1").await.expect("deleted");

    upload.assert_async().await;
    delete.assert_async().await;
}
