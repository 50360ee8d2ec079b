mod common;

use common::TestApp;
use serde_json::{json, Value};
use std::collections::HashSet;

#[tokio::test]
async fn average_balance_rounds_to_two_decimals() {
    let app = TestApp::spawn().await;

    app.create_account(5, 1001, "Alice", 100.0).await;
    app.create_account(5, 1002, "Bob", 50.0).await;
    app.create_account(5, 1003, "Carol", 50.0).await;
    // Another agency must not affect the mean
    app.create_account(6, 2001, "Dave", 1000.0).await;

    let response = app
        .client
        .get(format!("{}/accounts/average", app.address))
        .json(&json!({ "agency": 5 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    // 200 / 3 = 66.666..., rounded half away from zero
    assert_eq!(body["averageBalance"], 66.67);

    app.cleanup().await;
}

#[tokio::test]
async fn average_balance_of_empty_agency_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/accounts/average", app.address))
        .json(&json!({ "agency": 42 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn lowest_balances_sorts_ascending_with_name_tiebreak() {
    let app = TestApp::spawn().await;

    app.create_account(1, 1, "B", 100.0).await;
    app.create_account(1, 2, "A", 50.0).await;
    app.create_account(1, 3, "C", 50.0).await;

    let response = app
        .client
        .get(format!("{}/accounts/lowestBalance", app.address))
        .json(&json!({ "count": 2 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let accounts: Vec<Value> = response.json().await.expect("Failed to parse JSON");

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["name"], "A");
    assert_eq!(accounts[0]["balance"], 50.0);
    assert_eq!(accounts[1]["name"], "C");
    assert_eq!(accounts[1]["balance"], 50.0);

    app.cleanup().await;
}

#[tokio::test]
async fn highest_balances_sorts_descending_with_name_tiebreak() {
    let app = TestApp::spawn().await;

    app.create_account(1, 1, "B", 100.0).await;
    app.create_account(1, 2, "A", 50.0).await;
    app.create_account(1, 3, "C", 50.0).await;

    let response = app
        .client
        .get(format!("{}/accounts/highestBalance", app.address))
        .json(&json!({ "count": 2 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let accounts: Vec<Value> = response.json().await.expect("Failed to parse JSON");

    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["name"], "B");
    assert_eq!(accounts[0]["balance"], 100.0);
    assert_eq!(accounts[1]["name"], "A");
    assert_eq!(accounts[1]["balance"], 50.0);

    app.cleanup().await;
}

#[tokio::test]
async fn lowest_balances_with_negative_count_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/accounts/lowestBalance", app.address))
        .json(&json!({ "count": -1 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);

    app.cleanup().await;
}

#[tokio::test]
async fn private_agency_flags_the_richest_account_per_agency() {
    let app = TestApp::spawn().await;

    app.create_account(1, 1001, "Alice", 100.0).await;
    app.create_account(1, 1002, "Bob", 50.0).await;
    app.create_account(2, 2001, "Carol", 70.0).await;

    let response = app
        .client
        .get(format!("{}/accounts/privateAgency", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let flagged: Vec<Value> = response.json().await.expect("Failed to parse JSON");

    assert_eq!(flagged.len(), 2);
    for account in &flagged {
        assert_eq!(account["agency"], 99);
    }

    let numbers: HashSet<i64> = flagged
        .iter()
        .map(|account| account["account_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, HashSet::from([1001, 2001]));

    // The runner-up stays in its original agency
    assert_eq!(app.balance_of(1, 1002).await, 50.0);

    app.cleanup().await;
}

#[tokio::test]
async fn repeating_private_agency_flags_the_next_richest() {
    let app = TestApp::spawn().await;

    app.create_account(1, 1001, "Alice", 100.0).await;
    app.create_account(1, 1002, "Bob", 50.0).await;
    app.create_account(2, 2001, "Carol", 70.0).await;

    let first: Vec<Value> = app
        .client
        .get(format!("{}/accounts/privateAgency", app.address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(first.len(), 2);

    // Agencies are now {1, 99}: the second run flags Bob out of agency 1 and
    // re-selects the richest of agency 99 itself.
    let second: Vec<Value> = app
        .client
        .get(format!("{}/accounts/privateAgency", app.address))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Failed to parse JSON");

    assert_eq!(second.len(), 2);
    let numbers: HashSet<i64> = second
        .iter()
        .map(|account| account["account_number"].as_i64().unwrap())
        .collect();
    assert!(numbers.contains(&1002));

    app.cleanup().await;
}
