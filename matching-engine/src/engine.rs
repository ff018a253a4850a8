//! Engine: symbol routing and stream glue around the order books

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use common::decimal::{Price, Quantity};
use common::error::{Error, Result};
use common::model::order::{Order, OrderType, Status};
use common::model::trade::Trade;
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::order_book::{OrderBook, SubmitResult};

/// An inbound request: submit an order or cancel a resting one
#[derive(Debug)]
pub enum Request {
    /// Submit the order to the book for its symbol
    Submit(Order),
    /// Cancel a resting order
    Cancel {
        /// Market symbol the order was submitted under
        symbol: String,
        /// Id of the order to cancel
        order_id: String,
    },
}

/// The engine owns one order book per symbol and routes each request
/// to the book for its symbol.
///
/// All mutating operations for a symbol serialize on that book's write
/// lock; readers (depth snapshots, order lookups) take the shared
/// side.
pub struct Engine {
    /// Map of market symbols to order books
    books: DashMap<String, Arc<RwLock<OrderBook>>>,
    config: EngineConfig,
    /// Total orders processed
    orders_processed: AtomicU64,
    /// Total trades emitted
    trades_emitted: AtomicU64,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            books: DashMap::new(),
            config,
            orders_processed: AtomicU64::new(0),
            trades_emitted: AtomicU64::new(0),
        }
    }

    /// The injected configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit an order, creating the book for its symbol on demand.
    ///
    /// Returns the trades produced and the final snapshot of the
    /// incoming order.
    pub fn submit(&self, order: Order) -> Result<SubmitResult> {
        validate(&order)?;
        debug!(order_id = %order.id, symbol = %order.symbol, "processing order");

        let book = self
            .books
            .entry(order.symbol.clone())
            .or_insert_with(|| {
                Arc::new(RwLock::new(OrderBook::new(
                    order.symbol.clone(),
                    self.config.fee_rate,
                )))
            })
            .clone();

        let result = book.write().unwrap().submit(order)?;
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
        self.trades_emitted
            .fetch_add(result.trades.len() as u64, Ordering::Relaxed);
        Ok(result)
    }

    /// Cancel a resting order
    pub fn cancel(&self, symbol: &str, order_id: &str) -> Result<Order> {
        let book = self
            .books
            .get(symbol)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::MarketNotFound(symbol.to_string()))?;
        let result = book.write().unwrap().cancel(order_id);
        result
    }

    /// Get market depth: per-side (price, quantity) ladders, best first
    pub fn depth(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<(Vec<(Price, Quantity)>, Vec<(Price, Quantity)>)> {
        let book = self
            .books
            .get(symbol)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::MarketNotFound(symbol.to_string()))?;
        let book = book.read().unwrap();
        Ok(book.depth(limit))
    }

    /// Look up a resting order snapshot
    pub fn order(&self, symbol: &str, order_id: &str) -> Option<Order> {
        let book = self.books.get(symbol)?.value().clone();
        let book = book.read().unwrap();
        book.order(order_id).cloned()
    }

    /// Total orders processed since start
    pub fn orders_processed(&self) -> u64 {
        self.orders_processed.load(Ordering::Relaxed)
    }

    /// Total trades emitted since start
    pub fn trades_emitted(&self) -> u64 {
        self.trades_emitted.load(Ordering::Relaxed)
    }

    /// Spawn the request worker.
    ///
    /// The worker drains the inbound request channel and forwards each
    /// submit's trades to the outbound channel as one batch per
    /// submit. Empty batches are omitted.
    pub fn start(self: Arc<Self>) -> EngineService {
        let (order_tx, mut order_rx) = mpsc::channel(self.config.order_channel_capacity);
        let (trade_tx, trade_rx) = mpsc::channel(self.config.trade_channel_capacity);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let deadline = self.config.shutdown_deadline;

        let engine = self;
        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        // Drain whatever is already queued before exiting
                        while let Ok(request) = order_rx.try_recv() {
                            handle(&engine, request, &trade_tx).await;
                        }
                        break;
                    }
                    request = order_rx.recv() => {
                        match request {
                            Some(request) => handle(&engine, request, &trade_tx).await,
                            None => break,
                        }
                    }
                }
            }
            debug!("engine worker finished");
        });

        info!("matching engine started");
        EngineService {
            orders: order_tx,
            trades: Some(trade_rx),
            shutdown: shutdown_tx,
            worker,
            deadline,
        }
    }
}

async fn handle(engine: &Engine, request: Request, trade_tx: &mpsc::Sender<Vec<Trade>>) {
    match request {
        Request::Submit(order) => match engine.submit(order) {
            Ok(result) if !result.trades.is_empty() => {
                if trade_tx.send(result.trades).await.is_err() {
                    debug!("trade stream closed, dropping batch");
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "submit rejected"),
        },
        Request::Cancel { symbol, order_id } => {
            if let Err(err) = engine.cancel(&symbol, &order_id) {
                warn!(%err, %symbol, %order_id, "cancel rejected");
            }
        }
    }
}

/// Handle to a running engine worker and its channels
pub struct EngineService {
    orders: mpsc::Sender<Request>,
    trades: Option<mpsc::Receiver<Vec<Trade>>>,
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
    deadline: Duration,
}

impl EngineService {
    /// A sender for the inbound request stream
    pub fn requests(&self) -> mpsc::Sender<Request> {
        self.orders.clone()
    }

    /// Take the outbound trade stream; yields `None` after the first call
    pub fn take_trades(&mut self) -> Option<mpsc::Receiver<Vec<Trade>>> {
        self.trades.take()
    }

    /// Signal shutdown and wait for the worker to drain, bounded by
    /// the configured deadline
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        drop(self.orders);
        match timeout(self.deadline, self.worker).await {
            Ok(_) => info!("matching engine stopped"),
            Err(_) => warn!("matching engine stop timed out, possible deadlock"),
        }
    }
}

fn validate(order: &Order) -> Result<()> {
    if order.status != Status::Pending {
        return Err(Error::InvalidOrder(format!(
            "order {} has already been processed",
            order.id
        )));
    }
    if order.quantity <= Quantity::ZERO {
        return Err(Error::InvalidOrder(format!(
            "order {} has non-positive quantity",
            order.id
        )));
    }
    if order.remaining_quantity != order.quantity {
        return Err(Error::InvalidOrder(format!(
            "order {} remaining quantity does not equal its original quantity",
            order.id
        )));
    }
    match (order.order_type, order.price) {
        (OrderType::Limit, None) => Err(Error::InvalidOrder(format!(
            "limit order {} has no price",
            order.id
        ))),
        (OrderType::Limit, Some(price)) if price <= Price::ZERO => Err(Error::InvalidOrder(
            format!("limit order {} has non-positive price", order.id),
        )),
        (OrderType::Market, Some(_)) => Err(Error::InvalidOrder(format!(
            "market order {} carries a price",
            order.id
        ))),
        _ => Ok(()),
    }
}
