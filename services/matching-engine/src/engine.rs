//! Matching engine core
//!
//! Orchestrates validation, per-symbol serialization, order-type dispatch,
//! fee assignment, trade recording, trigger activation and event emission.
//! Every mutating operation on a symbol runs inside that symbol's mutex;
//! different symbols proceed independently.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use persistence::{
    load_or_empty, SnapshotDocument, SnapshotService, SnapshotSource, SymbolSnapshot,
    SNAPSHOT_VERSION,
};
use types::fee::FeeSchedule;
use types::ids::{IdGenerator, OrderId, Symbol, TradeId};
use types::numeric::{fractional_digits, significant_digits, Price, Quantity};
use types::order::{Order, OrderStatus, OrderType};
use types::time;
use types::trade::Trade;

use crate::api::{
    BboView, CancelResponse, L2View, OrderRequest, OrderResponse, RecentTradesView,
};
use crate::book::{Fill, LevelView, OrderBook};
use crate::config::EngineConfig;
use crate::error::RejectReason;
use crate::events::{BookChangedEvent, EventBus, MarketEvent, TradeEvent};
use crate::tape::TradeTape;
use crate::triggers::{self, TriggerTable};

/// Everything the engine owns for one symbol, guarded by one mutex.
struct SymbolState {
    book: OrderBook,
    triggers: TriggerTable,
    tape: TradeTape,
}

impl SymbolState {
    fn new(symbol: Symbol, tape_capacity: usize) -> Self {
        Self {
            book: OrderBook::new(symbol),
            triggers: TriggerTable::new(),
            tape: TradeTape::new(tape_capacity),
        }
    }
}

/// The matching engine: per-symbol books behind per-symbol locks.
pub struct MatchingEngine {
    config: EngineConfig,
    fees: FeeSchedule,
    ids: IdGenerator,
    /// Symbol registry; lock-free for readers once a symbol exists.
    symbols: DashMap<Symbol, Arc<Mutex<SymbolState>>>,
    /// order_id → symbol, for cancel routing across books and triggers.
    order_symbols: DashMap<OrderId, Symbol>,
    events: EventBus,
}

struct ValidatedRequest {
    symbol: Symbol,
    quantity: Quantity,
    price: Option<Price>,
    stop_price: Option<Price>,
    take_profit_price: Option<Price>,
}

impl MatchingEngine {
    pub fn new(config: EngineConfig) -> Self {
        let fees = FeeSchedule::new(
            config.maker_fee_bps,
            config.taker_fee_bps,
            config.fee_precision,
        );
        let events = EventBus::new(config.event_queue_capacity);
        Self {
            fees,
            events,
            ids: IdGenerator::new(),
            symbols: DashMap::new(),
            order_symbols: DashMap::new(),
            config,
        }
    }

    /// Start from the snapshot at the configured persist path, or empty if
    /// the snapshot is missing or unusable.
    pub fn recover(config: EngineConfig) -> Self {
        let document = load_or_empty(&config.persist_path);
        Self::from_snapshot(config, &document)
    }

    /// Rebuild an engine from a snapshot document.
    ///
    /// Resting orders are replayed through `add_limit` in their recorded
    /// order, which restores per-level FIFO; trigger tables keep their
    /// firing order; the id generator is advanced past every persisted id.
    pub fn from_snapshot(config: EngineConfig, document: &SnapshotDocument) -> Self {
        let engine = Self::new(config);
        let mut open_orders = 0usize;
        let mut trigger_orders = 0usize;
        for (symbol_key, snapshot) in &document.symbols {
            let Some(symbol) = Symbol::try_new(symbol_key.clone()) else {
                warn!(symbol = %symbol_key, "skipping snapshot entry with empty symbol");
                continue;
            };
            let entry = engine.symbol_state(&symbol);
            let mut state = entry.lock().expect("symbol state poisoned");
            for order in &snapshot.open_orders {
                engine.ids.observe(order.order_id.as_str());
                if order.price.is_none() || order.remaining.is_zero() {
                    warn!(order_id = %order.order_id, "skipping snapshot order that cannot rest");
                    continue;
                }
                engine
                    .order_symbols
                    .insert(order.order_id.clone(), symbol.clone());
                state.book.add_limit(order.clone());
                open_orders += 1;
            }
            for order in &snapshot.triggers {
                engine.ids.observe(order.order_id.as_str());
                engine
                    .order_symbols
                    .insert(order.order_id.clone(), symbol.clone());
                state.triggers.push(order.clone());
                trigger_orders += 1;
            }
            if let Some(price) = snapshot.last_trade_price {
                state.book.set_last_trade_price(price);
            }
            for trade in &snapshot.recent_trades {
                engine.ids.observe(trade.trade_id.as_str());
                state.tape.push(trade.clone());
            }
        }
        info!(
            symbols = document.symbols.len(),
            open_orders, trigger_orders, "engine state restored"
        );
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Spawn the background snapshot writer for this engine.
    pub fn start_snapshot_service(self: &Arc<Self>) -> SnapshotService {
        SnapshotService::start(
            self.clone(),
            self.config.persist_path.clone(),
            self.config.persist_interval,
        )
    }

    /// Submit an order.
    ///
    /// Validation happens before the symbol lock; dispatch, matching, fee
    /// assignment and trigger evaluation all run inside it. The response
    /// carries the trades the submitted order took part in as taker.
    pub fn submit(&self, request: OrderRequest) -> OrderResponse {
        let validated = match self.validate(&request) {
            Ok(validated) => validated,
            Err(reason) => return self.rejected_response(&request, &reason),
        };
        let ValidatedRequest {
            symbol,
            quantity,
            price,
            stop_price,
            take_profit_price,
        } = validated;

        let mut order = Order::new(
            self.ids.next_order_id(),
            symbol.clone(),
            request.side,
            request.order_type,
            quantity,
            price,
            stop_price,
            take_profit_price,
            request.client_order_id.clone(),
        );

        let entry = self.symbol_state(&symbol);
        let mut state = entry.lock().expect("symbol state poisoned");
        let state = &mut *state;

        let mut own_trades = Vec::new();

        if order.order_type.is_trigger() {
            order.park();
            self.order_symbols
                .insert(order.order_id.clone(), symbol.clone());
            if triggers::condition_met(&order, state.book.last_trade_price(), None, None) {
                // the market already traded through the trigger level
                let (trades, activated) = self.activate_order(&symbol, state, order);
                own_trades = trades;
                order = activated;
                self.run_trigger_loop(&symbol, state);
            } else {
                info!(
                    order_id = %order.order_id,
                    symbol = %symbol,
                    order_type = ?order.order_type,
                    "order parked pending trigger"
                );
                state.triggers.push(order.clone());
            }
            return Self::response(order, own_trades);
        }

        let mut book_changed = false;
        match order.order_type {
            OrderType::Fok => {
                if !state
                    .book
                    .fok_can_fill(order.side, order.price, order.quantity)
                {
                    order.reject();
                    info!(
                        order_id = %order.order_id,
                        symbol = %symbol,
                        reason = %RejectReason::InsufficientLiquidity,
                        "fok rejected"
                    );
                    return Self::response(order, own_trades);
                }
                let fills = state.book.match_order(&mut order);
                debug_assert!(order.remaining.is_zero());
                book_changed = !fills.is_empty();
                own_trades = self.record_trades(&symbol, state, &order, &fills);
            }
            OrderType::Market | OrderType::Ioc => {
                let fills = state.book.match_order(&mut order);
                book_changed = !fills.is_empty();
                own_trades = self.record_trades(&symbol, state, &order, &fills);
                if !order.remaining.is_zero() {
                    // market and IOC orders never rest
                    order.cancel();
                }
            }
            OrderType::Limit => {
                let fills = state.book.match_order(&mut order);
                book_changed = !fills.is_empty();
                own_trades = self.record_trades(&symbol, state, &order, &fills);
                if !order.remaining.is_zero() {
                    self.order_symbols
                        .insert(order.order_id.clone(), symbol.clone());
                    state.book.add_limit(order.clone());
                    book_changed = true;
                }
            }
            _ => unreachable!("trigger types handled above"),
        }

        if book_changed {
            self.publish_book(&symbol, state);
        }
        if !own_trades.is_empty() {
            self.run_trigger_loop(&symbol, state);
        }

        info!(
            order_id = %order.order_id,
            symbol = %symbol,
            order_type = ?order.order_type,
            side = ?order.side,
            filled = %order.filled,
            remaining = %order.remaining,
            "order processed"
        );
        Self::response(order, own_trades)
    }

    /// Cancel an order wherever it rests: in a book or a trigger table.
    ///
    /// An order that already completed (or was never accepted) reports
    /// not_found; cancellation is a value, never an error.
    pub fn cancel(&self, order_id: &OrderId) -> CancelResponse {
        let Some(symbol) = self
            .order_symbols
            .get(order_id)
            .map(|entry| entry.value().clone())
        else {
            return CancelResponse::not_found(order_id.clone());
        };

        let entry = self.symbol_state(&symbol);
        let mut state = entry.lock().expect("symbol state poisoned");
        let state = &mut *state;

        if let Some(order) = state.book.cancel(order_id) {
            debug_assert_eq!(order.status, OrderStatus::Cancelled);
            self.order_symbols.remove(order_id);
            self.publish_book(&symbol, state);
            info!(order_id = %order_id, symbol = %symbol, "order cancelled");
            return CancelResponse::cancelled(order_id.clone());
        }
        if let Some(mut order) = state.triggers.remove(order_id) {
            order.cancel();
            self.order_symbols.remove(order_id);
            info!(order_id = %order_id, symbol = %symbol, "trigger order cancelled");
            return CancelResponse::cancelled(order_id.clone());
        }

        // the index entry raced with a fill that completed the order
        self.order_symbols.remove(order_id);
        CancelResponse::not_found(order_id.clone())
    }

    /// Best bid and offer for a symbol.
    pub fn bbo(&self, symbol: &Symbol) -> BboView {
        let entry = self.symbol_state(symbol);
        let state = entry.lock().expect("symbol state poisoned");
        let view = |(price, quantity)| LevelView { price, quantity };
        BboView {
            symbol: symbol.clone(),
            bid: state.book.best_bid().map(view),
            ask: state.book.best_ask().map(view),
            timestamp: time::utc_now(),
        }
    }

    /// Aggregated book, `depth` levels per side.
    pub fn l2(&self, symbol: &Symbol, depth: usize) -> L2View {
        let entry = self.symbol_state(symbol);
        let state = entry.lock().expect("symbol state poisoned");
        let snapshot = state.book.l2_snapshot(depth);
        L2View {
            symbol: symbol.clone(),
            bids: snapshot.bids,
            asks: snapshot.asks,
            timestamp: time::utc_now(),
        }
    }

    /// Retained trades, optionally only those after `since`.
    pub fn recent_trades(&self, symbol: &Symbol, since: Option<&TradeId>) -> RecentTradesView {
        let entry = self.symbol_state(symbol);
        let state = entry.lock().expect("symbol state poisoned");
        let trades = match since {
            Some(trade_id) => state.tape.since(trade_id),
            None => state.tape.all(),
        };
        RecentTradesView {
            symbol: symbol.clone(),
            trades,
            latest_trade_id: state.tape.latest_id(),
        }
    }

    /// Subscribe to a symbol's trade and book-change events.
    pub fn subscribe(&self, symbol: &Symbol) -> Receiver<MarketEvent> {
        self.events.subscribe(symbol)
    }

    /// Capture a snapshot document, locking each symbol only for its copy.
    pub fn capture(&self) -> SnapshotDocument {
        let entries: Vec<(Symbol, Arc<Mutex<SymbolState>>)> = self
            .symbols
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let mut symbols = BTreeMap::new();
        for (symbol, entry) in entries {
            let state = entry.lock().expect("symbol state poisoned");
            symbols.insert(
                symbol.to_string(),
                SymbolSnapshot {
                    open_orders: state.book.open_orders(),
                    triggers: state.triggers.orders().to_vec(),
                    last_trade_price: state.book.last_trade_price(),
                    recent_trades: state.tape.all(),
                },
            );
        }
        SnapshotDocument {
            version: SNAPSHOT_VERSION,
            symbols,
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    fn symbol_state(&self, symbol: &Symbol) -> Arc<Mutex<SymbolState>> {
        self.symbols
            .entry(symbol.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SymbolState::new(
                    symbol.clone(),
                    self.config.recent_trades_limit,
                )))
            })
            .clone()
    }

    fn validate(&self, request: &OrderRequest) -> Result<ValidatedRequest, RejectReason> {
        let symbol =
            Symbol::try_new(request.symbol.clone()).ok_or(RejectReason::EmptySymbol)?;
        let quantity =
            Quantity::try_new(request.quantity).ok_or(RejectReason::InvalidQuantity)?;
        self.check_precision("quantity", request.quantity)?;

        let price = match request.price {
            Some(raw) => {
                self.check_precision("price", raw)?;
                Some(Price::try_new(raw).ok_or(RejectReason::InvalidPrice)?)
            }
            None => None,
        };
        match request.order_type {
            OrderType::Limit if price.is_none() => {
                return Err(RejectReason::MissingPrice("limit"))
            }
            OrderType::Ioc if price.is_none() => return Err(RejectReason::MissingPrice("ioc")),
            OrderType::StopLimit if price.is_none() => {
                return Err(RejectReason::MissingPrice("stop_limit"))
            }
            OrderType::Market if price.is_some() => {
                return Err(RejectReason::UnexpectedPrice("market"))
            }
            OrderType::Stop if price.is_some() => {
                return Err(RejectReason::UnexpectedPrice("stop"))
            }
            OrderType::TakeProfit if price.is_some() => {
                return Err(RejectReason::UnexpectedPrice("take_profit"))
            }
            _ => {}
        }

        let stop_price = match request.stop_price {
            Some(raw) => {
                self.check_precision("stop_price", raw)?;
                Some(Price::try_new(raw).ok_or(RejectReason::InvalidStopPrice)?)
            }
            None => None,
        };
        if matches!(request.order_type, OrderType::Stop | OrderType::StopLimit)
            && stop_price.is_none()
        {
            return Err(RejectReason::MissingStopPrice);
        }

        let take_profit_price = match request.take_profit_price {
            Some(raw) => {
                self.check_precision("take_profit_price", raw)?;
                Some(Price::try_new(raw).ok_or(RejectReason::InvalidTakeProfitPrice)?)
            }
            None => None,
        };
        if request.order_type == OrderType::TakeProfit && take_profit_price.is_none() {
            return Err(RejectReason::MissingTakeProfitPrice);
        }

        Ok(ValidatedRequest {
            symbol,
            quantity,
            price,
            stop_price,
            take_profit_price,
        })
    }

    fn check_precision(&self, field: &'static str, value: Decimal) -> Result<(), RejectReason> {
        if significant_digits(value) > self.config.max_significant_digits
            || fractional_digits(value) > self.config.max_decimal_places
        {
            return Err(RejectReason::PrecisionExceeded {
                field,
                value: value.to_string(),
            });
        }
        Ok(())
    }

    fn rejected_response(&self, request: &OrderRequest, reason: &RejectReason) -> OrderResponse {
        warn!(
            symbol = %request.symbol,
            order_type = ?request.order_type,
            reason = %reason,
            "order rejected"
        );
        let remaining = Quantity::try_new(request.quantity).unwrap_or_else(Quantity::zero);
        OrderResponse {
            // ids are assigned on acceptance only
            order_id: OrderId::unassigned(),
            status: OrderStatus::Rejected,
            filled_quantity: Quantity::zero(),
            remaining_quantity: remaining,
            trades: Vec::new(),
        }
    }

    fn response(order: Order, trades: Vec<Trade>) -> OrderResponse {
        OrderResponse {
            order_id: order.order_id,
            status: order.status,
            filled_quantity: order.filled,
            remaining_quantity: order.remaining,
            trades,
        }
    }

    /// Turn fills into fee-assigned trades: record on the tape, emit trade
    /// events, and unmap makers that completed.
    fn record_trades(
        &self,
        symbol: &Symbol,
        state: &mut SymbolState,
        taker: &Order,
        fills: &[Fill],
    ) -> Vec<Trade> {
        if fills.is_empty() {
            return Vec::new();
        }
        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            if fill.maker_completed {
                self.order_symbols.remove(&fill.maker_order_id);
            }
            let notional = fill.price.as_decimal() * fill.quantity.as_decimal();
            let (maker_fee, taker_fee) = self.fees.assess(notional);
            let trade = Trade::new(
                self.ids.next_trade_id(),
                symbol.clone(),
                fill.price,
                fill.quantity,
                taker.side,
                fill.maker_order_id.clone(),
                taker.order_id.clone(),
                time::utc_now(),
                maker_fee,
                taker_fee,
            );
            state.tape.push(trade.clone());
            self.events.publish(
                symbol,
                MarketEvent::Trade(TradeEvent {
                    symbol: symbol.clone(),
                    trade: trade.clone(),
                }),
            );
            trades.push(trade);
        }
        debug!(symbol = %symbol, count = trades.len(), "trades recorded");
        trades
    }

    fn publish_book(&self, symbol: &Symbol, state: &SymbolState) {
        self.events.publish(
            symbol,
            MarketEvent::BookChanged(BookChangedEvent {
                symbol: symbol.clone(),
                book: state.book.l2_snapshot(self.config.event_depth),
                timestamp: time::utc_now(),
            }),
        );
    }

    /// Activate a trigger order: convert it and re-enter the match path.
    ///
    /// Stop and take-profit become market orders; stop-limit becomes a
    /// limit at its limit price. Returns the trades taken and the order's
    /// final state.
    fn activate_order(
        &self,
        symbol: &Symbol,
        state: &mut SymbolState,
        mut order: Order,
    ) -> (Vec<Trade>, Order) {
        order.activate();
        match order.order_type {
            OrderType::Stop | OrderType::TakeProfit => order.order_type = OrderType::Market,
            OrderType::StopLimit => order.order_type = OrderType::Limit,
            _ => {}
        }
        info!(
            order_id = %order.order_id,
            symbol = %symbol,
            order_type = ?order.order_type,
            "trigger fired"
        );

        let fills = state.book.match_order(&mut order);
        let mut book_changed = !fills.is_empty();
        let trades = self.record_trades(symbol, state, &order, &fills);

        if !order.remaining.is_zero() {
            if order.order_type == OrderType::Limit {
                // order_symbols entry persists from parking
                state.book.add_limit(order.clone());
                book_changed = true;
            } else {
                order.cancel();
                self.order_symbols.remove(&order.order_id);
            }
        } else {
            self.order_symbols.remove(&order.order_id);
        }

        if book_changed {
            self.publish_book(symbol, state);
        }
        (trades, order)
    }

    /// Fire triggers until a full pass fires none.
    ///
    /// Terminates because each pass removes orders from a table that only
    /// grows between submissions, and an activated order never returns.
    fn run_trigger_loop(&self, symbol: &Symbol, state: &mut SymbolState) {
        loop {
            let (best_bid, best_ask) = state.book.bbo();
            let last = state.book.last_trade_price();
            let fired = state.triggers.take_fired(last, best_bid, best_ask);
            if fired.is_empty() {
                break;
            }
            for order in fired {
                let _ = self.activate_order(symbol, state, order);
            }
        }
    }
}

impl SnapshotSource for MatchingEngine {
    fn capture(&self) -> SnapshotDocument {
        MatchingEngine::capture(self)
    }
}
