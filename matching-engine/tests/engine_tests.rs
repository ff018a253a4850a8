use std::sync::Arc;

use common::error::Error;
use common::model::order::{Order, Side, Status};
use matching_engine::{Engine, EngineConfig, Request};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn limit(id: &str, symbol: &str, side: Side, price: Decimal, quantity: Decimal) -> Order {
    Order::new_limit(
        id.to_string(),
        format!("user-{id}"),
        symbol.to_string(),
        side,
        price,
        quantity,
    )
}

#[test]
fn submit_creates_the_book_on_demand() {
    let engine = Engine::new(EngineConfig::default());
    assert_eq!(engine.config().fee_rate, dec!(0.001));

    let result = engine
        .submit(limit("b1", "BTC/USDT", Side::Buy, dec!(10000), dec!(1)))
        .unwrap();
    assert!(result.trades.is_empty());

    let (bids, asks) = engine.depth("BTC/USDT", 10).unwrap();
    assert_eq!(bids, vec![(dec!(10000), dec!(1))]);
    assert!(asks.is_empty());
    assert_eq!(engine.orders_processed(), 1);
}

#[test]
fn requests_are_routed_by_symbol() {
    let engine = Engine::new(EngineConfig::default());
    engine
        .submit(limit("s1", "BTC/USDT", Side::Sell, dec!(100), dec!(1)))
        .unwrap();

    // same price on another symbol must not cross
    let result = engine
        .submit(limit("b1", "ETH/USDT", Side::Buy, dec!(100), dec!(1)))
        .unwrap();
    assert!(result.trades.is_empty());

    let result = engine
        .submit(limit("b2", "BTC/USDT", Side::Buy, dec!(100), dec!(1)))
        .unwrap();
    assert_eq!(result.trades.len(), 1);
    assert_eq!(engine.trades_emitted(), 1);
    assert_eq!(engine.orders_processed(), 3);
}

#[test]
fn cancel_routes_and_propagates_errors() {
    let engine = Engine::new(EngineConfig::default());
    engine
        .submit(limit("b1", "BTC/USDT", Side::Buy, dec!(100), dec!(1)))
        .unwrap();

    assert!(matches!(
        engine.cancel("ETH/USDT", "b1"),
        Err(Error::MarketNotFound(_))
    ));
    assert!(matches!(
        engine.cancel("BTC/USDT", "missing"),
        Err(Error::OrderNotFound(_))
    ));

    let cancelled = engine.cancel("BTC/USDT", "b1").unwrap();
    assert_eq!(cancelled.status, Status::Cancelled);
    assert!(engine.order("BTC/USDT", "b1").is_none());
}

#[test]
fn invalid_orders_are_rejected_at_the_boundary() {
    let engine = Engine::new(EngineConfig::default());

    let err = engine
        .submit(limit("z1", "BTC/USDT", Side::Buy, dec!(100), dec!(0)))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOrder(_)));

    let mut priceless = limit("z2", "BTC/USDT", Side::Buy, dec!(100), dec!(1));
    priceless.price = None;
    assert!(matches!(
        engine.submit(priceless),
        Err(Error::InvalidOrder(_))
    ));

    let mut priced_market =
        Order::new_market("z3".to_string(), "user-z3".to_string(), "BTC/USDT".to_string(), Side::Buy, dec!(1));
    priced_market.price = Some(dec!(100));
    assert!(matches!(
        engine.submit(priced_market),
        Err(Error::InvalidOrder(_))
    ));

    assert_eq!(engine.orders_processed(), 0);
}

#[test]
fn resting_order_snapshot_is_observable() {
    let engine = Engine::new(EngineConfig::default());
    engine
        .submit(limit("s1", "BTC/USDT", Side::Sell, dec!(101), dec!(2)))
        .unwrap();
    engine
        .submit(limit("b1", "BTC/USDT", Side::Buy, dec!(101), dec!(0.5)))
        .unwrap();

    let s1 = engine.order("BTC/USDT", "s1").expect("still resting");
    assert_eq!(s1.status, Status::PartiallyFilled);
    assert_eq!(s1.remaining_quantity, dec!(1.5));
}

#[tokio::test]
async fn worker_emits_one_batch_per_matching_submit() {
    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let mut service = engine.clone().start();
    let requests = service.requests();
    let mut trades = service.take_trades().expect("trade stream");

    requests
        .send(Request::Submit(limit("s1", "BTC/USDT", Side::Sell, dec!(99), dec!(1))))
        .await
        .unwrap();
    requests
        .send(Request::Submit(limit("s2", "BTC/USDT", Side::Sell, dec!(100), dec!(2))))
        .await
        .unwrap();
    // resting submits produce no batch; the crossing one produces one
    requests
        .send(Request::Submit(limit("b1", "BTC/USDT", Side::Buy, dec!(100), dec!(2))))
        .await
        .unwrap();

    let batch = trades.recv().await.expect("batch");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].price, dec!(99));
    assert_eq!(batch[1].price, dec!(100));
    assert_eq!(batch[0].taker_order_id, "b1");

    service.stop().await;
}

#[tokio::test]
async fn stop_drains_queued_requests() {
    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let mut service = engine.clone().start();
    let requests = service.requests();
    let mut trades = service.take_trades().expect("trade stream");

    for i in 0..10 {
        let side = if i % 2 == 0 { Side::Sell } else { Side::Buy };
        requests
            .send(Request::Submit(limit(
                &format!("o{i}"),
                "BTC/USDT",
                side,
                dec!(100),
                dec!(1),
            )))
            .await
            .unwrap();
    }
    requests
        .send(Request::Cancel {
            symbol: "BTC/USDT".to_string(),
            order_id: "does-not-exist".to_string(),
        })
        .await
        .unwrap();
    drop(requests);

    service.stop().await;
    assert_eq!(engine.orders_processed(), 10);

    // five crossing buys, one batch each; then the stream closes
    for _ in 0..5 {
        assert!(trades.recv().await.is_some());
    }
    assert!(trades.recv().await.is_none());
}
