use jse_portal::{
    InMemoryRepository,
    models::{CreateUserRequest, NewUser, Role, UploadUrlRequest, UserUpdate},
    repository::{RepoError, Repository},
};

#[test]
fn test_role_wire_format() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    assert_eq!(
        serde_json::from_str::<Role>("\"client\"").unwrap(),
        Role::Client
    );
    assert!(serde_json::from_str::<Role>("\"Admin\"").is_err());

    assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    assert!("owner".parse::<Role>().is_err());
    assert_eq!(Role::Client.to_string(), "client");
}

#[test]
fn test_request_payloads_are_camel_case() {
    let req: CreateUserRequest =
        serde_json::from_str(r#"{"email":"a@b.com","displayName":"A","role":"admin"}"#).unwrap();
    assert_eq!(req.display_name.as_deref(), Some("A"));
    assert_eq!(req.role, Some(Role::Admin));

    let req: UploadUrlRequest = serde_json::from_str(r#"{"fileType":"image/png"}"#).unwrap();
    assert_eq!(req.file_name, "");
    assert_eq!(req.file_type.as_deref(), Some("image/png"));
    assert_eq!(req.file_size, None);
}

fn new_user(id: &str, email: &str) -> NewUser {
    NewUser {
        id: id.to_string(),
        email: email.to_string(),
        display_name: None,
        role: Role::Client,
    }
}

#[tokio::test]
async fn test_in_memory_directory() {
    let repo = InMemoryRepository::new();

    let created = repo.create_user(new_user("u1", "Cut@Studio.com")).await.unwrap();
    assert_eq!(created.role, Role::Client);

    let duplicate = repo.create_user(new_user("u2", "cut@studio.com")).await;
    assert!(matches!(duplicate, Err(RepoError::Conflict(_))));

    let found = repo.get_user_by_email("CUT@studio.com").await.unwrap();
    assert_eq!(found.map(|u| u.id).as_deref(), Some("u1"));

    let updated = repo.set_role("cut@studio.com", Role::Admin).await.unwrap();
    assert_eq!(updated.map(|u| u.role), Some(Role::Admin));
    assert!(repo.set_role("nobody@x.com", Role::Admin).await.unwrap().is_none());

    assert!(repo.disable_user("u1").await.unwrap());
    assert!(!repo.disable_user("missing").await.unwrap());
    assert!(repo.get_user("u1").await.unwrap().unwrap().disabled);

    assert_eq!(repo.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_in_memory_update_and_delete() {
    let repo = InMemoryRepository::new();
    repo.create_user(NewUser {
        display_name: Some("Cutter".to_string()),
        ..new_user("u1", "cut@studio.com")
    })
    .await
    .unwrap();

    let updated = repo
        .update_user(
            "u1",
            UserUpdate {
                role: Some(Role::Admin),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.display_name.as_deref(), Some("Cutter"));

    let cleared = repo
        .update_user(
            "u1",
            UserUpdate {
                display_name: Some(None),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.display_name, None);

    assert!(
        repo.update_user("missing", UserUpdate::default())
            .await
            .unwrap()
            .is_none()
    );

    assert!(repo.delete_user("u1").await.unwrap());
    assert!(!repo.delete_user("u1").await.unwrap());
    assert!(repo.get_user("u1").await.unwrap().is_none());
}
