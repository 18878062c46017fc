mod common;

use common::{init_info_body, test_config, SKU};
use httpmock::prelude::*;
use jd_seckill::core::session::build_client;
use jd_seckill::{Seckill, SeckillError};
use std::sync::Arc;
use tempfile::TempDir;

fn seckill_for(server: &MockServer, temp_dir: &TempDir) -> Seckill {
    let config = Arc::new(test_config(&server.base_url(), temp_dir.path()));
    let client = build_client(&config).unwrap();
    Seckill::new(client, config)
}

#[tokio::test]
async fn test_sku_title_from_item_page() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/{}.html", SKU));
            then.status(200).body(
                r#"<html><div class="sku-name">
                    <img src="//img.jd.com/tag.png" />Feitian 53%vol 500ml
                </div></html>"#,
            );
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    assert_eq!(seckill.sku_title().await.unwrap(), "Feitian 53%vol 500ml");
}

#[tokio::test]
async fn test_reserve_follows_reservation_url() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let reserve_url = server.url("/bespeak/doBespeak.action?sku=8654289");

    let info = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/youshouinfo.action")
                .query_param("callback", "fetchJSON")
                .query_param("sku", SKU);
            then.status(200)
                .body(format!(r#"fetchJSON({{"type":"1","state":2,"url":"{}"}})"#, reserve_url));
        })
        .await;

    let bespeak = server
        .mock_async(|when, then| {
            when.method(GET).path("/bespeak/doBespeak.action");
            then.status(200).body("ok");
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    seckill.reserve().await.unwrap();

    info.assert_async().await;
    bespeak.assert_async().await;
}

#[tokio::test]
async fn test_reserve_without_url_fails() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/youshouinfo.action");
            then.status(200).body(r#"fetchJSON({"type":"0"})"#);
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    let err = seckill.reserve().await.unwrap_err();
    assert!(matches!(err, SeckillError::ReservationError { .. }));
}

#[tokio::test]
async fn test_seckill_url_not_ready_is_retried() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    let show_btn = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/itemShowBtn")
                .query_param("skuId", SKU)
                .query_param("from", "pc");
            then.status(200).body(r#"jQuery1234567({"url":""})"#);
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    let err = seckill.request_seckill_url().await.unwrap_err();

    assert!(matches!(err, SeckillError::SeckillNotReady));
    assert_eq!(show_btn.hits_async().await, 2);
}

#[tokio::test]
async fn test_run_chain_places_order() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let routing_url = server.url("/user_routing?skuId=8654289&sn=c3f4ece&from=pc");

    server
        .mock_async(|when, then| {
            when.method(GET).path("/itemShowBtn");
            then.status(200)
                .body(format!(r#"jQuery7654321({{"url":"{}"}})"#, routing_url));
        })
        .await;

    let captcha = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/captcha.html")
                .query_param("sn", "c3f4ece");
            then.status(200).body("<html>captcha</html>");
        })
        .await;

    let checkout = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/seckill/seckill.action")
                .query_param("skuId", SKU)
                .query_param("num", "1");
            then.status(200).body("<html>checkout</html>");
        })
        .await;

    let init = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/seckillnew/orderService/pc/init.action")
                .body_contains("sku=8654289")
                .body_contains("isModifyAddress=false");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(init_info_body());
        })
        .await;

    let submit = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/seckillnew/orderService/pc/submitOrder.action")
                .query_param("skuId", SKU)
                .body_contains("addressId=138263081")
                .body_contains("eid=EID123")
                .body_contains("fp=FP456")
                .body_contains("password=654321")
                .body_contains("token=init-token")
                .body_contains("invoice=false");
            then.status(200).json_body(serde_json::json!({
                "success": true,
                "orderId": 201234567890u64,
                "totalMoney": "1499.00",
                "pcUrl": "//cashier.jd.com/payment/pay.action?orderId=201234567890"
            }));
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    let receipt = seckill.run_chain().await.unwrap();

    captcha.assert_async().await;
    checkout.assert_async().await;
    init.assert_async().await;
    submit.assert_async().await;

    assert_eq!(receipt.order_id, "201234567890");
    assert_eq!(receipt.total_money, "1499.00");
    assert_eq!(
        receipt.pay_url,
        "https://cashier.jd.com/payment/pay.action?orderId=201234567890"
    );
}

#[tokio::test]
async fn test_submit_order_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/init.action");
            then.status(200).json_body(init_info_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/submitOrder.action");
            then.status(200)
                .body(r#"{"success":false,"errorMessage":"很遗憾没有抢到，再接再厉哦。","resultCode":90016}"#);
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    match seckill.submit_order().await {
        Err(SeckillError::OrderRejected { body }) => assert!(body.contains("90016")),
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_order_non_json_response() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/init.action");
            then.status(200).json_body(init_info_body());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/submitOrder.action");
            then.status(200).body("<html>busy</html>");
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    let err = seckill.submit_order().await.unwrap_err();
    assert!(matches!(err, SeckillError::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn test_submit_order_without_address() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/init.action");
            then.status(200)
                .json_body(serde_json::json!({"addressList": [], "token": "t"}));
        })
        .await;
    let submit = server
        .mock_async(|when, then| {
            when.method(POST).path("/seckillnew/orderService/pc/submitOrder.action");
            then.status(200).body("{}");
        })
        .await;

    let seckill = seckill_for(&server, &temp_dir);
    assert!(seckill.submit_order().await.is_err());
    assert_eq!(submit.hits_async().await, 0);
}
