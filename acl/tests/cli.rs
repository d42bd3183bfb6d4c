use std::{path::Path, sync::Arc};

use clap::Parser;
use coronado_acl::{
    dal_init,
    model::{AccessType, UserId},
    policy::AccessRequest,
    run, AccessControl, Args, Commands, Config, Error, Sqlite, ACL_ACCESS_POLICY,
    OWNER_ACCESS_POLICY,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn uri(dir: &Path) -> String {
    format!("sqlite://{}", dir.join("acl.sqlite").display())
}

fn command(uri: &str, args: &[&str]) -> Commands {
    let argv = ["acl", "--db-connection-uri", uri]
        .into_iter()
        .chain(args.iter().copied());

    Args::try_parse_from(argv).unwrap().command
}

/// A file database with the host application's users already in place.
async fn database(uri: &str, users: &[UserId]) -> Sqlite {
    let dal = Sqlite::new(uri).await.unwrap();

    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY)")
        .execute(dal.pool())
        .await
        .unwrap();

    for id in users {
        sqlx::query("INSERT INTO users (id) VALUES (?)")
            .bind(id)
            .execute(dal.pool())
            .await
            .unwrap();
    }

    dal
}

#[tokio::test]
async fn manage_access() {
    let dir = TempDir::new().unwrap();
    let uri = uri(dir.path());
    let dal = database(&uri, &[1, 2]).await;

    let output = run(&dal, command(&uri, &["install-schema"])).await.unwrap();
    assert_eq!(output, "ACL schema version 2 installed.");

    let output = run(&dal, command(&uri, &["get-schema-version"]))
        .await
        .unwrap();
    assert_eq!(output, "2");

    let output = run(&dal, command(&uri, &["upgrade-schema"])).await.unwrap();
    assert_eq!(output, "Schema version is up to date.");

    let output = run(
        &dal,
        command(&uri, &["add-access-ctl-object", "document", "7", "1"]),
    )
    .await
    .unwrap();
    assert_eq!(
        output,
        "Added access control object 1 for document 7 owned by user 1."
    );

    let output = run(&dal, command(&uri, &["grant", "document", "7", "2", "read"]))
        .await
        .unwrap();
    assert_eq!(output, "Granted read on document 7 to user 2.");

    let acl = AccessControl::start(Arc::new(dal.clone()), Config::new())
        .await
        .unwrap();
    let reader = AccessRequest::new(Some(2), "document".parse().unwrap(), 7)
        .with_access_type(AccessType::read());

    assert_eq!(acl.verify_access(ACL_ACCESS_POLICY, &reader).await.unwrap(), 1);
    assert!(matches!(
        acl.verify_access(OWNER_ACCESS_POLICY, &reader).await,
        Err(Error::Forbidden)
    ));

    let output = run(&dal, command(&uri, &["revoke", "document", "7", "2", "read"]))
        .await
        .unwrap();
    assert_eq!(output, "Revoked read on document 7 from user 2.");

    assert!(matches!(
        acl.verify_access(ACL_ACCESS_POLICY, &reader).await,
        Err(Error::Forbidden)
    ));
}

#[tokio::test]
async fn errors_are_reported() {
    let dir = TempDir::new().unwrap();
    let uri = uri(dir.path());
    let dal = database(&uri, &[1]).await;

    let error = run(&dal, command(&uri, &["get-schema-version"]))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "ACL schema not installed.");

    run(&dal, command(&uri, &["install-schema"])).await.unwrap();

    let error = run(&dal, command(&uri, &["install-schema"]))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "ACL schema version 2 is already installed.");

    let error = run(&dal, command(&uri, &["grant", "document", "7", "1", "read"]))
        .await
        .unwrap_err();
    assert_eq!(error.to_string(), "object not found");

    run(
        &dal,
        command(&uri, &["add-access-ctl-object", "document", "7", "1"]),
    )
    .await
    .unwrap();
    let error = run(
        &dal,
        command(&uri, &["add-access-ctl-object", "document", "7", "1"]),
    )
    .await
    .unwrap_err();
    assert_eq!(error.to_string(), "object already has access control");
}

#[tokio::test]
async fn state_survives_reconnect() {
    let dir = TempDir::new().unwrap();
    let uri = uri(dir.path());

    {
        let dal = database(&uri, &[1]).await;
        run(&dal, command(&uri, &["install-schema"])).await.unwrap();
        run(
            &dal,
            command(&uri, &["add-access-ctl-object", "folder", "3", "1"]),
        )
        .await
        .unwrap();
        dal.pool().close().await;
    }

    let dal = dal_init(&uri).await.unwrap();
    let acl = AccessControl::start(dal, Config::new()).await.unwrap();
    let owner = AccessRequest::new(Some(1), "folder".parse().unwrap(), 3);

    assert_eq!(acl.verify_access(OWNER_ACCESS_POLICY, &owner).await.unwrap(), 1);
}

#[tokio::test]
async fn unsupported_database() {
    assert!(matches!(
        dal_init("postgres://localhost/acl").await,
        Err(Error::UnsupportedDatabase)
    ));
}
