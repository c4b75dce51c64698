//! Integration tests for the client lifecycle

mod common;

use common::{setup, task_input};
use workdesk_shared::models::client::{ClientFilter, ClientStatus};
use workdesk_shared::services::clients::{self, ClientInput};
use workdesk_shared::services::tasks::{self, TaskInput};
use workdesk_shared::CoreError;

fn client(company: &str, industry: &str) -> ClientInput {
    ClientInput {
        company_name: company.to_string(),
        contact_name: "John Westfield".to_string(),
        contact_email: "john@westfieldacc.co.uk".to_string(),
        industry: Some(industry.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_staff_has_no_client_access() {
    let env = setup().await;
    let created = clients::create(&env.pool, &env.admin, client("Westfield", "Accounting"))
        .await
        .unwrap();

    assert!(matches!(
        clients::list(&env.pool, &env.staff_a, &ClientFilter::default()).await,
        Err(CoreError::AuthorizationDenied)
    ));
    assert!(matches!(
        clients::get(&env.pool, &env.staff_a, created.id).await,
        Err(CoreError::AuthorizationDenied)
    ));
    assert!(matches!(
        clients::create(&env.pool, &env.staff_a, client("Other", "Legal")).await,
        Err(CoreError::AuthorizationDenied)
    ));
}

#[tokio::test]
async fn test_manager_edits_but_cannot_delete() {
    let env = setup().await;
    let created = clients::create(&env.pool, &env.finance_manager, client("GreenLeaf", "Marketing"))
        .await
        .unwrap();

    let updated = clients::update(
        &env.pool,
        &env.finance_manager,
        created.id,
        ClientInput {
            status: Some("inactive".to_string()),
            ..client("GreenLeaf Ltd", "Marketing")
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.company_name, "GreenLeaf Ltd");
    assert_eq!(updated.status, ClientStatus::Inactive);

    assert!(matches!(
        clients::delete(&env.pool, &env.finance_manager, created.id).await,
        Err(CoreError::AuthorizationDenied)
    ));
    assert!(clients::get(&env.pool, &env.admin, created.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_blocked_by_linked_tasks() {
    let env = setup().await;
    let linked = clients::create(&env.pool, &env.admin, client("BridgePoint", "Legal"))
        .await
        .unwrap();
    tasks::create(
        &env.pool,
        &env.admin,
        TaskInput {
            client_id: Some(linked.id),
            ..task_input("Compliance review", "Finance", None)
        },
    )
    .await
    .unwrap();

    let result = clients::delete(&env.pool, &env.admin, linked.id).await;
    let Err(CoreError::Conflict(message)) = result else {
        panic!("expected conflict");
    };
    assert!(message.contains('1'));

    let still_there = clients::get(&env.pool, &env.admin, linked.id).await.unwrap();
    assert_eq!(still_there, linked);
}

#[tokio::test]
async fn test_delete_without_tasks() {
    let env = setup().await;
    let lonely = clients::create(&env.pool, &env.admin, client("TechForward", "Technology"))
        .await
        .unwrap();

    clients::delete(&env.pool, &env.admin, lonely.id).await.unwrap();

    assert!(matches!(
        clients::get(&env.pool, &env.admin, lonely.id).await,
        Err(CoreError::NotFound("Client"))
    ));
    assert!(matches!(
        clients::delete(&env.pool, &env.admin, lonely.id).await,
        Err(CoreError::NotFound("Client"))
    ));
}

#[tokio::test]
async fn test_list_filters_and_ordering() {
    let env = setup().await;
    clients::create(&env.pool, &env.admin, client("Westfield Accountants", "Accounting"))
        .await
        .unwrap();
    clients::create(&env.pool, &env.admin, client("BridgePoint Legal", "Legal"))
        .await
        .unwrap();
    clients::create(
        &env.pool,
        &env.admin,
        ClientInput {
            status: Some("inactive".to_string()),
            ..client("Midlands Property", "Real Estate")
        },
    )
    .await
    .unwrap();

    let all = clients::list(&env.pool, &env.finance_manager, &ClientFilter::default())
        .await
        .unwrap();
    let names: Vec<&str> = all.iter().map(|c| c.company_name.as_str()).collect();
    assert_eq!(names, vec!["BridgePoint Legal", "Midlands Property", "Westfield Accountants"]);

    let active = ClientFilter {
        status: Some(ClientStatus::Active),
        ..Default::default()
    };
    assert_eq!(clients::list(&env.pool, &env.admin, &active).await.unwrap().len(), 2);

    let legal = ClientFilter {
        industry: Some("Legal".to_string()),
        ..Default::default()
    };
    assert_eq!(clients::list(&env.pool, &env.admin, &legal).await.unwrap().len(), 1);

    let search = ClientFilter {
        search: Some("westfield".to_string()),
        ..Default::default()
    };
    // Every fixture shares the same contact email, so the search matches all three
    assert_eq!(clients::list(&env.pool, &env.admin, &search).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_invalid_client_rejected() {
    let env = setup().await;

    let result = clients::create(
        &env.pool,
        &env.admin,
        ClientInput {
            contact_email: "nope".to_string(),
            ..client("Bad", "Legal")
        },
    )
    .await;
    assert!(matches!(result, Err(CoreError::ValidationFailed(_))));

    assert!(matches!(
        clients::update(&env.pool, &env.admin, 77, client("Ghost", "Legal")).await,
        Err(CoreError::NotFound("Client"))
    ));
}
