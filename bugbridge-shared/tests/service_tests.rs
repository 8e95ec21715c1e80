//! Integration tests for the business rules in the service layer

mod common;

use bugbridge_shared::auth::context::AuthContext;
use bugbridge_shared::auth::password::verify_password;
use bugbridge_shared::models::bug::{BugPriority, BugStatus};
use bugbridge_shared::models::user::{User, UserRole};
use bugbridge_shared::services::bug::{BugChanges, NewBug};
use bugbridge_shared::services::user::{NewUser, UserDetails};
use bugbridge_shared::services::{AssignmentService, BugService, ServiceError, UserService};
use common::{insert_user, setup_pool};

fn registration(name: &str, email: &str, role: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "secret123".to_string(),
        role: role.to_string(),
    }
}

fn report(reported_by: i64, assigned_to: Option<i64>, priority: &str) -> NewBug {
    NewBug {
        reported_by,
        assigned_to,
        description: "Crash on save".to_string(),
        priority: priority.to_string(),
    }
}

#[tokio::test]
async fn test_register_then_find_by_email() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);

    let alice = users
        .register(registration("Alice", "alice@x.com", " tester "))
        .await
        .unwrap();

    let found = users.find_by_email("alice@x.com").await.unwrap().unwrap();
    assert_eq!(found.id, alice.id);
    assert_eq!(found.name, "Alice");
    assert_eq!(found.role, UserRole::Tester);
    assert_ne!(found.password_hash, "secret123");
    assert!(verify_password("secret123", &found.password_hash).unwrap());
}

#[tokio::test]
async fn test_register_duplicate_email_keeps_first() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);

    let first = users
        .register(registration("Alice", "alice@x.com", "TESTER"))
        .await
        .unwrap();

    let err = users
        .register(registration("Impostor", "ALICE@x.com", "DEVELOPER"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(_)));

    let stored = users.find_by_email("alice@x.com").await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.name, "Alice");
    assert_eq!(stored.role, UserRole::Tester);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);

    let err = users
        .register(NewUser {
            name: "A1".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            role: "MANAGER".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::Validation(violations) => {
            let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, vec!["name", "email", "password", "role"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = users
        .register(registration("Mallory", "mallory@x.com", "admin"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert!(users.find_by_email("mallory@x.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_authenticate() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let alice = users
        .register(registration("Alice", "alice@x.com", "TESTER"))
        .await
        .unwrap();

    let logged_in = users.authenticate("alice@x.com", "secret123").await.unwrap();
    assert_eq!(logged_in.id, alice.id);

    assert!(matches!(
        users.authenticate("alice@x.com", "wrong-password").await,
        Err(ServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        users.authenticate("ghost@x.com", "secret123").await,
        Err(ServiceError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_authenticate_with_corrupt_stored_hash_fails_loudly() {
    let pool = setup_pool().await;
    // Fixture hash has a salt but no output
    insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;

    assert!(matches!(
        UserService::new(&pool)
            .authenticate("tess@x.com", "secret123")
            .await,
        Err(ServiceError::Password(_))
    ));
}

#[tokio::test]
async fn test_ensure_admin_is_idempotent() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);

    let first = users
        .ensure_admin("Root Admin", "root@x.com", "rootpass123")
        .await
        .unwrap();
    let second = users
        .ensure_admin("Root Admin", "root@x.com", "rootpass123")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.role, UserRole::Admin);
    assert_eq!(User::count_by_role(&pool, UserRole::Admin).await.unwrap(), 1);

    insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    assert!(matches!(
        users.ensure_admin("Tess", "tess@x.com", "rootpass123").await,
        Err(ServiceError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn test_role_listings() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let admin = insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await;
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;

    let testers = users.list_testers().await.unwrap();
    assert_eq!(testers.iter().map(|u| u.id).collect::<Vec<_>>(), vec![tester.id]);

    let developers = users.list_developers().await.unwrap();
    assert_eq!(developers.iter().map(|u| u.id).collect::<Vec<_>>(), vec![dev.id]);

    let members = users.list_developers_and_testers().await.unwrap();
    assert_eq!(members.len(), 2);

    let all = users.list_all_users(&AuthContext::from(&admin)).await.unwrap();
    assert_eq!(all.len(), 3);

    assert!(matches!(
        users.list_all_users(&AuthContext::from(&tester)).await,
        Err(ServiceError::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_update_user_permissions() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let admin = insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await;
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;

    let as_tester = AuthContext::from(&tester);

    // Self update
    let rows = users
        .update_user(
            &as_tester,
            tester.id,
            UserDetails {
                name: Some("Tess Tester".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        users.find_by_id(tester.id).await.unwrap().unwrap().name,
        "Tess Tester"
    );

    // Someone else's account
    assert!(matches!(
        users
            .update_user(&as_tester, dev.id, UserDetails::default())
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    // Own role
    assert!(matches!(
        users
            .update_user(
                &as_tester,
                tester.id,
                UserDetails {
                    role: Some("developer".to_string()),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    // Admin may change anyone's role
    users
        .update_user(
            &AuthContext::from(&admin),
            dev.id,
            UserDetails {
                role: Some("tester".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        users.find_by_id(dev.id).await.unwrap().unwrap().role,
        UserRole::Tester
    );

    // Unknown id
    assert!(matches!(
        users
            .update_user(&AuthContext::from(&admin), 999, UserDetails::default())
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_user_email_and_password() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let tester = users
        .register(registration("Tess", "tess@x.com", "TESTER"))
        .await
        .unwrap();
    insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;
    let caller = AuthContext::from(&tester);

    let err = users
        .update_user(
            &caller,
            tester.id,
            UserDetails {
                email: Some("DAVE@x.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyExists(_)));

    // Re-saving one's own email in another case is not a conflict
    users
        .update_user(
            &caller,
            tester.id,
            UserDetails {
                email: Some("TESS@x.com".to_string()),
                password: Some("newsecret456".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(users.authenticate("tess@x.com", "newsecret456").await.is_ok());
    assert!(matches!(
        users.authenticate("tess@x.com", "secret123").await,
        Err(ServiceError::InvalidCredentials)
    ));

    assert!(matches!(
        users
            .update_user(
                &caller,
                tester.id,
                UserDetails {
                    email: Some("broken".to_string()),
                    ..Default::default()
                },
            )
            .await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_delete_user_requires_admin() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let admin = insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await;
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;

    assert!(matches!(
        users
            .delete_user(&AuthContext::from(&tester), "root@x.com")
            .await,
        Err(ServiceError::Forbidden(_))
    ));

    users
        .delete_user(&AuthContext::from(&admin), "tess@x.com")
        .await
        .unwrap();
    assert!(users.find_by_id(tester.id).await.unwrap().is_none());

    assert!(matches!(
        users
            .delete_user(&AuthContext::from(&admin), "tess@x.com")
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_last_admin_cannot_be_deleted() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let root = AuthContext::from(&insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await);

    assert!(matches!(
        users.delete_user(&root, "root@x.com").await,
        Err(ServiceError::Forbidden(_))
    ));

    let second = insert_user(&pool, "Ada", "ada@x.com", UserRole::Admin).await;
    users.delete_user(&root, "ada@x.com").await.unwrap();
    assert!(users.find_by_id(second.id).await.unwrap().is_none());
    assert_eq!(User::count_by_role(&pool, UserRole::Admin).await.unwrap(), 1);
}

#[tokio::test]
async fn test_role_change_blocked_while_bugs_assigned() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let bugs = BugService::new(&pool);
    let admin = AuthContext::from(&insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;

    let bug = bugs
        .create_bug(report(tester.id, Some(dev.id), "HIGH"))
        .await
        .unwrap();

    let to_tester = || UserDetails {
        role: Some("TESTER".to_string()),
        ..Default::default()
    };

    match users.update_user(&admin, dev.id, to_tester()).await {
        Err(ServiceError::Validation(v)) => assert_eq!(v[0].field, "role"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(
        users.find_by_id(dev.id).await.unwrap().unwrap().role,
        UserRole::Developer
    );

    // Other fields still update while bugs are assigned
    users
        .update_user(
            &admin,
            dev.id,
            UserDetails {
                name: Some("Dave Dev".to_string()),
                role: Some("developer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // A deleted bug no longer holds the developer
    bugs.delete_bug(bug.id).await.unwrap();
    assert_eq!(users.update_user(&admin, dev.id, to_tester()).await.unwrap(), 1);
    assert_eq!(
        users.find_by_id(dev.id).await.unwrap().unwrap().role,
        UserRole::Tester
    );
}

#[tokio::test]
async fn test_create_bug_assignee_rules() {
    let pool = setup_pool().await;
    let bugs = BugService::new(&pool);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let other_tester = insert_user(&pool, "Toby", "toby@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;

    let bug = bugs
        .create_bug(report(tester.id, Some(dev.id), "low"))
        .await
        .unwrap();
    assert_eq!(bug.priority, BugPriority::Low);
    assert_eq!(bug.status, BugStatus::Open);
    assert_eq!(bug.assigned_to, Some(dev.id));

    // Assignee must be a developer, and nothing is persisted otherwise
    let err = bugs
        .create_bug(report(tester.id, Some(other_tester.id), "HIGH"))
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation(v) => assert_eq!(v[0].field, "assignedTo"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(bugs.find_all().await.unwrap().len(), 1);

    assert!(matches!(
        bugs.create_bug(report(tester.id, Some(999), "HIGH")).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        bugs.create_bug(report(999, None, "HIGH")).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        bugs.create_bug(report(tester.id, None, "urgent")).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn test_find_by_assigned_to_id_is_exact() {
    let pool = setup_pool().await;
    let bugs = BugService::new(&pool);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let d1 = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;
    let d2 = insert_user(&pool, "Dana", "dana@x.com", UserRole::Developer).await;

    let mut expected = Vec::new();
    for i in 0..4 {
        let assignee = if i % 2 == 0 { d1.id } else { d2.id };
        let bug = bugs
            .create_bug(report(tester.id, Some(assignee), "MEDIUM"))
            .await
            .unwrap();
        if assignee == d1.id {
            expected.push(bug.id);
        }
    }
    bugs.create_bug(report(tester.id, None, "LOW")).await.unwrap();

    let found = bugs.find_by_assigned_to_id(d1.id).await.unwrap();
    assert_eq!(found.iter().map(|b| b.id).collect::<Vec<_>>(), expected);
    assert!(found.iter().all(|b| b.assigned_to == Some(d1.id)));

    assert_eq!(bugs.find_by_reported_by_id(tester.id).await.unwrap().len(), 5);
    assert!(bugs.find_by_reported_by_id(d1.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_bug() {
    let pool = setup_pool().await;
    let bugs = BugService::new(&pool);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;
    let bug = bugs.create_bug(report(tester.id, None, "LOW")).await.unwrap();

    let updated = bugs
        .update_bug(
            bug.id,
            BugChanges {
                status: Some("in_progress".to_string()),
                assigned_to: Some(dev.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, BugStatus::InProgress);
    assert_eq!(updated.assignee_name.as_deref(), Some("Dave"));
    assert_eq!(updated.priority, BugPriority::Low);

    assert!(matches!(
        bugs.update_bug(
            bug.id,
            BugChanges {
                assigned_to: Some(tester.id),
                ..Default::default()
            }
        )
        .await,
        Err(ServiceError::Validation(_))
    ));

    bugs.delete_bug(bug.id).await.unwrap();
    assert!(bugs.find_bug_by_id(bug.id).await.unwrap().is_deleted);
    assert!(bugs.find_all().await.unwrap().is_empty());

    assert!(matches!(bugs.delete_bug(bug.id).await, Err(ServiceError::NotFound(_))));
    assert!(matches!(
        bugs.update_bug(bug.id, BugChanges::default()).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(bugs.find_bug_by_id(999).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_assign_moves_bug_to_developer() {
    let pool = setup_pool().await;
    let bugs = BugService::new(&pool);
    let assignments = AssignmentService::new(&pool);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let d1 = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;
    let d2 = insert_user(&pool, "Dana", "dana@x.com", UserRole::Developer).await;
    let bug = bugs.create_bug(report(tester.id, None, "HIGH")).await.unwrap();

    let first = assignments.assign(bug.id, tester.id, d1.id).await.unwrap();
    assert_eq!(first.bug_id, bug.id);
    assert_eq!(first.tester_name, "Tess");
    assert_eq!(first.developer_name, "Dave");

    let after = bugs.find_bug_by_id(bug.id).await.unwrap();
    assert_eq!(after.status, BugStatus::InProgress);
    assert_eq!(after.assigned_to, Some(d1.id));

    // Reassignment appends history and keeps a non-OPEN status
    bugs.update_bug(
        bug.id,
        BugChanges {
            status: Some("RESOLVED".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assignments.assign(bug.id, tester.id, d2.id).await.unwrap();

    let after = bugs.find_bug_by_id(bug.id).await.unwrap();
    assert_eq!(after.status, BugStatus::Resolved);
    assert_eq!(after.assigned_to, Some(d2.id));

    let history = assignments.history_for_bug(bug.id).await.unwrap();
    assert_eq!(
        history.iter().map(|a| a.developer_name.as_str()).collect::<Vec<_>>(),
        vec!["Dave", "Dana"]
    );
    assert_eq!(assignments.assignments_by_tester(tester.id).await.unwrap().len(), 2);
    assert_eq!(assignments.assignments_for_developer(d1.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_assign_checks_roles_atomically() {
    let pool = setup_pool().await;
    let bugs = BugService::new(&pool);
    let assignments = AssignmentService::new(&pool);
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;
    let bug = bugs.create_bug(report(tester.id, None, "HIGH")).await.unwrap();

    // Roles swapped
    assert!(matches!(
        assignments.assign(bug.id, dev.id, tester.id).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        assignments.assign(999, tester.id, dev.id).await,
        Err(ServiceError::NotFound(_))
    ));

    let unchanged = bugs.find_bug_by_id(bug.id).await.unwrap();
    assert_eq!(unchanged.status, BugStatus::Open);
    assert!(unchanged.assigned_to.is_none());
    assert!(assignments.history_for_bug(bug.id).await.unwrap().is_empty());
    assert!(matches!(
        assignments.history_for_bug(999).await,
        Err(ServiceError::NotFound(_))
    ));

    bugs.delete_bug(bug.id).await.unwrap();
    assert!(matches!(
        assignments.assign(bug.id, tester.id, dev.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_user_cascades_through_services() {
    let pool = setup_pool().await;
    let users = UserService::new(&pool);
    let bugs = BugService::new(&pool);
    let assignments = AssignmentService::new(&pool);
    let admin = insert_user(&pool, "Root", "root@x.com", UserRole::Admin).await;
    let tester = insert_user(&pool, "Tess", "tess@x.com", UserRole::Tester).await;
    let reporter = insert_user(&pool, "Rita", "rita@x.com", UserRole::Tester).await;
    let dev = insert_user(&pool, "Dave", "dave@x.com", UserRole::Developer).await;

    let bug = bugs.create_bug(report(reporter.id, None, "LOW")).await.unwrap();
    assignments.assign(bug.id, tester.id, dev.id).await.unwrap();

    users
        .delete_user(&AuthContext::from(&admin), "tess@x.com")
        .await
        .unwrap();

    // The bug survives (Rita reported it), the hand-off record does not
    assert!(assignments.history_for_bug(bug.id).await.unwrap().is_empty());
    assert_eq!(bugs.find_by_assigned_to_id(dev.id).await.unwrap().len(), 1);

    users
        .delete_user(&AuthContext::from(&admin), "dave@x.com")
        .await
        .unwrap();
    assert!(matches!(bugs.find_bug_by_id(bug.id).await, Err(ServiceError::NotFound(_))));
}
