mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_and_fetch_category() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let name = common::unique("Electronics");

    let res = common::create_category(server, &token, &name, &[]).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = res.json::<Value>().await?;
    assert_eq!(created["name"], name.as_str());
    assert_eq!(created["subcategories"], json!([]));
    let id = created["id"].as_i64().unwrap();

    let res = reqwest::Client::new()
        .get(format!("{}/categories/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let fetched = res.json::<Value>().await?;
    assert_eq!(fetched["id"], id);
    assert_eq!(fetched["name"], name.as_str());
    assert!(fetched["created_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn duplicate_name_conflicts_with_message() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let name = common::unique("Duplicate");

    let res = common::create_category(server, &token, &name, &[]).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = common::create_category(server, &token, &name, &[]).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "Category with this name already exists"
    );
    Ok(())
}

#[tokio::test]
async fn name_is_trimmed_before_uniqueness() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let name = common::unique("Padded");

    let res = common::create_category(server, &token, &name, &[]).await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = common::create_category(server, &token, &format!("  {name} "), &[]).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn blank_name_is_unprocessable() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;

    let res = common::create_category(server, &token, "   ", &[]).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.json::<Value>().await?["message"], "Cannot be empty");
    Ok(())
}

#[tokio::test]
async fn unknown_subcategory_ids_are_unprocessable() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;

    let res =
        common::create_category(server, &token, &common::unique("Orphan"), &[i64::MAX - 1]).await?;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "One or more subcategories not present"
    );
    Ok(())
}

#[tokio::test]
async fn update_renames_category() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let old_name = common::unique("OldName");
    let new_name = common::unique("NewName");

    let created = common::create_category(server, &token, &old_name, &[])
        .await?
        .json::<Value>()
        .await?;
    let id = created["id"].as_i64().unwrap();

    let res = reqwest::Client::new()
        .put(format!("{}/categories/{}", server.base_url, id))
        .header("authorization", common::bearer(&token))
        .json(&json!({ "name": new_name }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = res.json::<Value>().await?;
    assert_eq!(updated["id"], id);
    assert_eq!(updated["name"], new_name.as_str());
    Ok(())
}

#[tokio::test]
async fn missing_category_is_404() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let client = reqwest::Client::new();
    let missing = i64::MAX - 2;

    let res = client
        .get(format!("{}/categories/{}", server.base_url, missing))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .put(format!("{}/categories/{}", server.base_url, missing))
        .header("authorization", common::bearer(&token))
        .json(&json!({ "name": "whatever" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(format!("{}/categories/{}", server.base_url, missing))
        .header("authorization", common::bearer(&token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn delete_returns_no_content_then_404() -> Result<()> {
    let Some(server) = common::server_or_skip().await? else {
        return Ok(());
    };
    let token = common::access_token(server).await?;
    let client = reqwest::Client::new();

    let created = common::create_category(server, &token, &common::unique("ToDelete"), &[])
        .await?
        .json::<Value>()
        .await?;
    let id = created["id"].as_i64().unwrap();

    let res = client
        .delete(format!("{}/categories/{}", server.base_url, id))
        .header("authorization", common::bearer(&token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/categories/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
