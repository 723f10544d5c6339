// bridge-core/src/conformance.rs
// ====================================================================
// Conformance checker
// ====================================================================
//
// A facade is observed, not inspected: it is built over a recording dialer,
// every contract operation is invoked once with sample values for the
// required parameters and nothing else, and the captured frames show the
// parameter names, their order, positional vs name-only, and the defaults
// the facade materialised. The recording channel answers null, so the
// returned value shows how the facade renders an absent result.

use crate::config::Settings;
use crate::facade::blocking::Terminal;
use crate::facade::suspending::AsyncTerminal;
use crate::facade::traits::{AsyncBridgeControl, AsyncTerminalApi, BridgeControl, TerminalApi};
use crate::transport::recording::{FrameLog, RecordingDialer};
use crate::transport::wire::RequestFrame;
use bridge_common::constants::{OrderType, Timeframe};
use bridge_common::contract::{
    compare_param_lists, compare_params, CallStyle, Contract, Mismatch, Optionality, ParamKind,
    ParamShape, ResultKind, ResultShape,
};
use bridge_common::errors::{BridgeError, BridgeResult, TerminalError};
use bridge_common::value::OrderRequest;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub use bridge_common::contract::{check_contract_pair, validate_contract, ContractViolation};

// ====================================================================
// OBSERVED SURFACE
// ====================================================================

/// How a facade rendered a null answer from the terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedResult {
    Absent,
    Present,
    Bool(bool),
    Int(i64),
    Unit,
    ErrorTuple,
    Failed(String),
}

impl fmt::Display for ObservedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedResult::Absent => write!(f, "absent"),
            ObservedResult::Present => write!(f, "present"),
            ObservedResult::Bool(b) => write!(f, "bool {}", b),
            ObservedResult::Int(i) => write!(f, "int {}", i),
            ObservedResult::Unit => write!(f, "unit"),
            ObservedResult::ErrorTuple => write!(f, "error tuple"),
            ObservedResult::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Converts a facade's return value into an [`ObservedResult`].
pub trait Observe {
    fn observe(self) -> ObservedResult;
}

impl Observe for BridgeResult<bool> {
    fn observe(self) -> ObservedResult {
        match self {
            Ok(b) => ObservedResult::Bool(b),
            Err(e) => ObservedResult::Failed(e.to_string()),
        }
    }
}

impl Observe for BridgeResult<i64> {
    fn observe(self) -> ObservedResult {
        match self {
            Ok(i) => ObservedResult::Int(i),
            Err(e) => ObservedResult::Failed(e.to_string()),
        }
    }
}

impl Observe for BridgeResult<()> {
    fn observe(self) -> ObservedResult {
        match self {
            Ok(()) => ObservedResult::Unit,
            Err(e) => ObservedResult::Failed(e.to_string()),
        }
    }
}

impl<T> Observe for BridgeResult<Option<T>> {
    fn observe(self) -> ObservedResult {
        match self {
            Ok(Some(_)) => ObservedResult::Present,
            Ok(None) => ObservedResult::Absent,
            Err(e) => ObservedResult::Failed(e.to_string()),
        }
    }
}

impl Observe for TerminalError {
    fn observe(self) -> ObservedResult {
        ObservedResult::ErrorTuple
    }
}

/// One parameter as it appeared on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedParam {
    pub name: String,
    pub kind: ParamKind,
    /// Set when the probe passed an explicit value.
    pub supplied: bool,
    pub value: Value,
}

impl ParamShape for ObservedParam {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParamKind {
        self.kind
    }

    fn default_json(&self) -> Option<Value> {
        (!self.supplied).then(|| self.value.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedOperation {
    /// Wire name taken from the captured frame.
    pub name: String,
    pub params: Vec<ObservedParam>,
    pub result: ObservedResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservedSurface {
    pub style: CallStyle,
    pub operations: Vec<ObservedOperation>,
    /// Methods put on the wire by the bridge-only operations.
    pub bridge_frames: Vec<String>,
    /// Liveness reported after `connect` and after `disconnect`.
    pub connected_after_connect: bool,
    pub connected_after_disconnect: bool,
}

impl ObservedSurface {
    fn new(style: CallStyle) -> Self {
        Self {
            style,
            operations: Vec::new(),
            bridge_frames: Vec::new(),
            connected_after_connect: false,
            connected_after_disconnect: false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ObservedOperation> {
        self.operations.iter().find(|op| op.name == name)
    }

    fn record(&mut self, probe: &Probe, frames: Vec<RequestFrame>, result: ObservedResult) {
        if frames.is_empty() {
            debug!(op = probe.op, "probe produced no frame");
        }
        for frame in frames {
            let params = frame
                .params()
                .map(|(arg, kind)| ObservedParam {
                    name: arg.name.clone(),
                    kind,
                    supplied: probe.supplied.contains(&arg.name.as_str()),
                    value: arg.value.clone(),
                })
                .collect();
            self.operations.push(ObservedOperation {
                name: frame.method,
                params,
                result: result.clone(),
            });
        }
    }

    fn record_bridge(&mut self, frames: Vec<RequestFrame>) {
        self.bridge_frames.extend(frames.into_iter().map(|f| f.method));
    }
}

// ====================================================================
// PROBES
// ====================================================================

/// One contract operation and the parameters the probe passes explicitly.
/// Everything else is left to the facade's defaults.
struct Probe {
    op: &'static str,
    supplied: &'static [&'static str],
}

const fn probe(op: &'static str, supplied: &'static [&'static str]) -> Probe {
    Probe { op, supplied }
}

// Catalog order; the depth subscription precedes the depth read.
const PROBES: [Probe; 32] = [
    probe("initialize", &[]),
    probe("login", &["login"]),
    probe("shutdown", &[]),
    probe("version", &[]),
    probe("lastError", &[]),
    probe("terminalInfo", &[]),
    probe("accountInfo", &[]),
    probe("symbolsTotal", &[]),
    probe("symbolsGet", &[]),
    probe("symbolInfo", &["symbol"]),
    probe("symbolInfoTick", &["symbol"]),
    probe("symbolSelect", &["symbol"]),
    probe("copyRatesFrom", &["symbol", "timeframe", "date_from", "count"]),
    probe("copyRatesFromPos", &["symbol", "timeframe", "start_pos", "count"]),
    probe("copyRatesRange", &["symbol", "timeframe", "date_from", "date_to"]),
    probe("copyTicksFrom", &["symbol", "date_from", "count", "flags"]),
    probe("copyTicksRange", &["symbol", "date_from", "date_to", "flags"]),
    probe("orderCalcMargin", &["action", "symbol", "volume", "price"]),
    probe("orderCalcProfit", &["action", "symbol", "volume", "price_open", "price_close"]),
    probe("orderCheck", &["request"]),
    probe("orderSend", &["request"]),
    probe("positionsTotal", &[]),
    probe("positionsGet", &[]),
    probe("ordersTotal", &[]),
    probe("ordersGet", &[]),
    probe("historyOrdersTotal", &["date_from", "date_to"]),
    probe("historyOrdersGet", &[]),
    probe("historyDealsTotal", &["date_from", "date_to"]),
    probe("historyDealsGet", &[]),
    probe("marketBookAdd", &["symbol"]),
    probe("marketBookGet", &["symbol"]),
    probe("marketBookRelease", &["symbol"]),
];

const SAMPLE_SYMBOL: &str = "EURUSD";
const SAMPLE_LOGIN: u64 = 12345;

fn sample_time(offset_secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap_or_default()
}

fn sample_request() -> OrderRequest {
    OrderRequest::new()
        .with("action", 1)
        .with("symbol", SAMPLE_SYMBOL)
        .with("volume", 0.1)
        .with("type", 0)
}

/// Invokes one probe on a facade. `$($wait)*` is empty for the blocking
/// facade and `.await` for the suspending one.
macro_rules! invoke {
    ($facade:expr, $op:expr $(, $wait:tt)*) => {{
        let f = $facade;
        let from = sample_time(0);
        let to = sample_time(86_400);
        let request = sample_request();
        match $op {
            "initialize" => f.initialize(None, None, None, None, None, Default::default())$(.$wait)*.observe(),
            "login" => f.login(SAMPLE_LOGIN, None, None, None)$(.$wait)*.observe(),
            "shutdown" => f.shutdown()$(.$wait)*.observe(),
            "version" => f.version()$(.$wait)*.observe(),
            "lastError" => f.last_error()$(.$wait)*.observe(),
            "terminalInfo" => f.terminal_info()$(.$wait)*.observe(),
            "accountInfo" => f.account_info()$(.$wait)*.observe(),
            "symbolsTotal" => f.symbols_total()$(.$wait)*.observe(),
            "symbolsGet" => f.symbols_get(Default::default())$(.$wait)*.observe(),
            "symbolInfo" => f.symbol_info(SAMPLE_SYMBOL)$(.$wait)*.observe(),
            "symbolInfoTick" => f.symbol_info_tick(SAMPLE_SYMBOL)$(.$wait)*.observe(),
            "symbolSelect" => f.symbol_select(SAMPLE_SYMBOL, Default::default())$(.$wait)*.observe(),
            "copyRatesFrom" => f.copy_rates_from(SAMPLE_SYMBOL, Timeframe::H1, from, 10)$(.$wait)*.observe(),
            "copyRatesFromPos" => f.copy_rates_from_pos(SAMPLE_SYMBOL, Timeframe::H1, 0, 10)$(.$wait)*.observe(),
            "copyRatesRange" => f.copy_rates_range(SAMPLE_SYMBOL, Timeframe::H1, from, to)$(.$wait)*.observe(),
            "copyTicksFrom" => f.copy_ticks_from(SAMPLE_SYMBOL, from, 100, -1)$(.$wait)*.observe(),
            "copyTicksRange" => f.copy_ticks_range(SAMPLE_SYMBOL, from, to, -1)$(.$wait)*.observe(),
            "orderCalcMargin" => f.order_calc_margin(OrderType::Buy, SAMPLE_SYMBOL, 0.1, 1.1)$(.$wait)*.observe(),
            "orderCalcProfit" => f.order_calc_profit(OrderType::Buy, SAMPLE_SYMBOL, 0.1, 1.1, 1.2)$(.$wait)*.observe(),
            "orderCheck" => f.order_check(&request)$(.$wait)*.observe(),
            "orderSend" => f.order_send(&request)$(.$wait)*.observe(),
            "positionsTotal" => f.positions_total()$(.$wait)*.observe(),
            "positionsGet" => f.positions_get(Default::default())$(.$wait)*.observe(),
            "ordersTotal" => f.orders_total()$(.$wait)*.observe(),
            "ordersGet" => f.orders_get(Default::default())$(.$wait)*.observe(),
            "historyOrdersTotal" => f.history_orders_total(from, to)$(.$wait)*.observe(),
            "historyOrdersGet" => f.history_orders_get(Default::default())$(.$wait)*.observe(),
            "historyDealsTotal" => f.history_deals_total(from, to)$(.$wait)*.observe(),
            "historyDealsGet" => f.history_deals_get(Default::default())$(.$wait)*.observe(),
            "marketBookAdd" => f.market_book_add(SAMPLE_SYMBOL)$(.$wait)*.observe(),
            "marketBookGet" => f.market_book_get(SAMPLE_SYMBOL)$(.$wait)*.observe(),
            "marketBookRelease" => f.market_book_release(SAMPLE_SYMBOL)$(.$wait)*.observe(),
            other => ObservedResult::Failed(format!("no probe for {}", other)),
        }
    }};
}

/// Observes a blocking facade whose channels record into `log`.
/// Must run outside any async runtime.
pub fn observe_blocking<F>(facade: &F, log: &FrameLog) -> ObservedSurface
where
    F: TerminalApi + BridgeControl,
{
    let mut surface = ObservedSurface::new(CallStyle::Blocking);
    log.drain();

    let _ = facade.connect();
    surface.connected_after_connect = facade.is_connected();
    facade.health_check();
    facade.breaker_status();
    surface.record_bridge(log.drain());

    for probe in &PROBES {
        let result = invoke!(facade, probe.op);
        surface.record(probe, log.drain(), result);
    }

    facade.disconnect();
    surface.connected_after_disconnect = facade.is_connected();
    surface.record_bridge(log.drain());
    surface
}

/// Observes a suspending facade whose channels record into `log`.
pub async fn observe_suspending<F>(facade: &F, log: &FrameLog) -> ObservedSurface
where
    F: AsyncTerminalApi + AsyncBridgeControl,
{
    let mut surface = ObservedSurface::new(CallStyle::Suspending);
    log.drain();

    let _ = facade.connect().await;
    surface.connected_after_connect = facade.is_connected();
    facade.health_check().await;
    facade.breaker_status().await;
    surface.record_bridge(log.drain());

    for probe in &PROBES {
        let result = invoke!(facade, probe.op, await);
        surface.record(probe, log.drain(), result);
    }

    facade.disconnect().await;
    surface.connected_after_disconnect = facade.is_connected();
    surface.record_bridge(log.drain());
    surface
}

/// A blocking facade over a recording dialer, with the dialer's log.
pub fn recording_terminal() -> BridgeResult<(Terminal, FrameLog)> {
    let dialer = RecordingDialer::new();
    let log = dialer.log();
    let terminal = Terminal::with_dialer(Settings::default(), Arc::new(dialer))?;
    Ok((terminal, log))
}

/// A suspending facade over a recording dialer, with the dialer's log.
pub fn recording_async_terminal() -> (AsyncTerminal, FrameLog) {
    let dialer = RecordingDialer::new();
    let log = dialer.log();
    (AsyncTerminal::with_dialer(Settings::default(), Arc::new(dialer)), log)
}

// ====================================================================
// CHECKS
// ====================================================================

/// Whether `observed` is an acceptable rendering of a null answer for an
/// operation declared with `shape`. Subscriptions answer `true`.
pub fn result_compatible(shape: ResultShape, observed: &ObservedResult) -> bool {
    use ObservedResult as O;
    match (shape.optionality, observed) {
        (_, O::Failed(_)) => false,
        (Optionality::Maybe, O::Absent) => true,
        (Optionality::Nominal, O::Absent) => true,
        (Optionality::Nominal, O::Int(0)) => shape.kind == ResultKind::Int,
        (Optionality::Never, O::Bool(_)) => shape.kind == ResultKind::Bool,
        (Optionality::Never, O::Unit) => shape.kind == ResultKind::Unit,
        (Optionality::Never, O::ErrorTuple) => shape.kind == ResultKind::ErrorTuple,
        _ => false,
    }
}

/// Checks one observed facade against a contract catalog.
pub fn check_facade(contract: &Contract, observed: &ObservedSurface) -> Result<(), ContractViolation> {
    let mut found = Vec::new();

    let mut seen = HashSet::new();
    for op in &observed.operations {
        if !seen.insert(op.name.as_str()) {
            found.push(Mismatch::DuplicateOperation { op: op.name.clone() });
        }
        if contract.lookup(&op.name).is_none() {
            found.push(Mismatch::UnexpectedOperation { op: op.name.clone() });
        }
    }

    for spec in &contract.operations {
        let Some(op) = observed.lookup(spec.name) else {
            found.push(Mismatch::MissingOperation {
                op: spec.name.to_string(),
            });
            continue;
        };
        compare_params(spec, &op.params, &mut found);
        if !result_compatible(spec.result, &op.result) {
            found.push(Mismatch::ResultShapeMismatch {
                op: spec.name.to_string(),
                expected: spec.result.to_string(),
                found: op.result.to_string(),
            });
        }
    }

    // Bridge-only operations stay off the contract surface.
    for method in &observed.bridge_frames {
        found.push(Mismatch::UnexpectedOperation {
            op: method.clone(),
        });
    }

    ContractViolation::check(format!("{} facade", observed.style), found)
}

/// The two facades must put the same signatures on the wire and render
/// absence the same way.
pub fn check_facades_agree(
    blocking: &ObservedSurface,
    suspending: &ObservedSurface,
) -> Result<(), ContractViolation> {
    let mut found = Vec::new();

    for left in &blocking.operations {
        let Some(right) = suspending.lookup(&left.name) else {
            found.push(Mismatch::MissingOperation { op: left.name.clone() });
            continue;
        };
        compare_param_lists(&left.name, &left.params, &right.params, &mut found);
        if left.result != right.result {
            found.push(Mismatch::ResultShapeMismatch {
                op: left.name.clone(),
                expected: left.result.to_string(),
                found: right.result.to_string(),
            });
        }
    }
    for right in &suspending.operations {
        if blocking.lookup(&right.name).is_none() {
            found.push(Mismatch::UnexpectedOperation { op: right.name.clone() });
        }
    }

    ContractViolation::check("blocking vs suspending facade", found)
}

// ====================================================================
// REPORT
// ====================================================================

/// Outcome of every check, catalog level first.
#[derive(Debug)]
pub struct ConformanceReport {
    pub blocking_contract: Result<(), ContractViolation>,
    pub suspending_contract: Result<(), ContractViolation>,
    pub contract_pair: Result<(), ContractViolation>,
    pub blocking_facade: Result<(), ContractViolation>,
    pub suspending_facade: Result<(), ContractViolation>,
    pub facades_agree: Result<(), ContractViolation>,
}

impl ConformanceReport {
    pub fn violations(&self) -> Vec<&ContractViolation> {
        [
            &self.blocking_contract,
            &self.suspending_contract,
            &self.contract_pair,
            &self.blocking_facade,
            &self.suspending_facade,
            &self.facades_agree,
        ]
        .into_iter()
        .filter_map(|r| r.as_ref().err())
        .collect()
    }

    pub fn is_conformant(&self) -> bool {
        self.violations().is_empty()
    }

    /// First violation as a [`BridgeError::Contract`].
    pub fn into_result(self) -> BridgeResult<()> {
        self.blocking_contract?;
        self.suspending_contract?;
        self.contract_pair?;
        self.blocking_facade?;
        self.suspending_facade?;
        self.facades_agree?;
        Ok(())
    }
}

/// Runs the full check against both built-in facades. Blocks the calling
/// thread; must not be called from inside an async runtime.
pub fn check_all() -> BridgeResult<ConformanceReport> {
    let blocking_contract = Contract::blocking();
    let suspending_contract = Contract::suspending();

    let (terminal, log) = recording_terminal()?;
    let blocking = observe_blocking(&terminal, &log);
    drop(terminal);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Connection(format!("cannot start conformance runtime: {}", e)))?;
    let (async_terminal, async_log) = recording_async_terminal();
    let suspending = runtime.block_on(observe_suspending(&async_terminal, &async_log));

    let report = ConformanceReport {
        blocking_contract: validate_contract(&blocking_contract),
        suspending_contract: validate_contract(&suspending_contract),
        contract_pair: check_contract_pair(&blocking_contract, &suspending_contract),
        blocking_facade: check_facade(&blocking_contract, &blocking),
        suspending_facade: check_facade(&suspending_contract, &suspending),
        facades_agree: check_facades_agree(&blocking, &suspending),
    };
    info!(
        conformant = report.is_conformant(),
        violations = report.violations().len(),
        "conformance check finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn blocking_surface() -> ObservedSurface {
        let (terminal, log) = recording_terminal().unwrap();
        observe_blocking(&terminal, &log)
    }

    fn param<'a>(surface: &'a ObservedSurface, op: &str, name: &str) -> &'a ObservedParam {
        surface
            .lookup(op)
            .unwrap()
            .params
            .iter()
            .find(|p| p.name == name)
            .unwrap()
    }

    #[test]
    fn test_builtin_facades_conform() {
        let report = check_all().unwrap();
        for violation in report.violations() {
            eprintln!("{}", violation);
        }
        assert!(report.is_conformant());
        report.into_result().unwrap();
    }

    #[test]
    fn test_surface_captures_every_operation() {
        let surface = blocking_surface();
        assert_eq!(surface.operations.len(), 32);
        assert!(surface.bridge_frames.is_empty());
        assert!(surface.connected_after_connect);
        assert!(!surface.connected_after_disconnect);
    }

    #[test]
    fn test_defaults_are_materialised() {
        let surface = blocking_surface();

        let portable = param(&surface, "initialize", "portable");
        assert_eq!(portable.kind, ParamKind::NameOnly);
        assert_eq!(portable.default_json(), Some(json!(false)));

        let timeout = param(&surface, "login", "timeout");
        assert_eq!(timeout.kind, ParamKind::Positional);
        assert_eq!(timeout.default_json(), Some(json!(60_000)));

        let login = param(&surface, "login", "login");
        assert!(login.is_required());

        let enable = param(&surface, "symbolSelect", "enable");
        assert_eq!(enable.kind, ParamKind::NameOnly);
        assert_eq!(enable.default_json(), Some(json!(true)));
    }

    #[test]
    fn test_absent_results_under_null_answers() {
        let surface = blocking_surface();
        assert_eq!(surface.lookup("symbolsTotal").unwrap().result, ObservedResult::Int(0));
        assert_eq!(surface.lookup("accountInfo").unwrap().result, ObservedResult::Absent);
        assert_eq!(surface.lookup("marketBookGet").unwrap().result, ObservedResult::Absent);
        assert_eq!(surface.lookup("marketBookAdd").unwrap().result, ObservedResult::Bool(true));
        assert_eq!(surface.lookup("lastError").unwrap().result, ObservedResult::ErrorTuple);
    }

    #[test]
    fn test_detects_positional_flag_and_wrong_default() {
        let mut surface = blocking_surface();
        let op = surface
            .operations
            .iter_mut()
            .find(|op| op.name == "symbolSelect")
            .unwrap();
        op.params[1].kind = ParamKind::Positional;
        let op = surface
            .operations
            .iter_mut()
            .find(|op| op.name == "login")
            .unwrap();
        op.params[3].value = json!(30_000);

        let violation = check_facade(&Contract::blocking(), &surface).unwrap_err();
        assert!(violation.mismatches.iter().any(|m| matches!(
            m,
            Mismatch::KindMismatch { op, param, .. } if op == "symbolSelect" && param == "enable"
        )));
        assert!(violation.mismatches.iter().any(|m| matches!(
            m,
            Mismatch::DefaultMismatch { op, found, .. } if op == "login" && found == "30000"
        )));
        assert!(violation.mentions("login"));
    }

    #[test]
    fn test_detects_missing_operation_and_extra_required_param() {
        let mut surface = blocking_surface();
        surface.operations.retain(|op| op.name != "ordersTotal");
        let op = surface
            .operations
            .iter_mut()
            .find(|op| op.name == "copyRatesFromPos")
            .unwrap();
        op.params.push(ObservedParam {
            name: "strict".into(),
            kind: ParamKind::Positional,
            supplied: true,
            value: json!(true),
        });

        let violation = check_facade(&Contract::blocking(), &surface).unwrap_err();
        assert!(violation.mismatches.contains(&Mismatch::MissingOperation {
            op: "ordersTotal".into()
        }));
        assert!(violation.mismatches.contains(&Mismatch::ExtraRequiredParam {
            op: "copyRatesFromPos".into(),
            param: "strict".into()
        }));
    }

    #[test]
    fn test_optionality_narrowing_only_where_nominal() {
        let contract = Contract::blocking();
        let total = contract.lookup("symbolsTotal").unwrap().result;
        let history = contract.lookup("historyOrdersTotal").unwrap().result;
        assert!(result_compatible(total, &ObservedResult::Int(0)));
        assert!(result_compatible(history, &ObservedResult::Absent));
        assert!(!result_compatible(history, &ObservedResult::Int(0)));
        assert!(!result_compatible(total, &ObservedResult::Failed("x".into())));
    }

    #[test]
    fn test_bridge_frames_are_flagged() {
        let mut surface = blocking_surface();
        surface.bridge_frames.push("shutdown".into());
        let violation = check_facade(&Contract::blocking(), &surface).unwrap_err();
        assert_eq!(
            violation.mismatches,
            vec![Mismatch::UnexpectedOperation { op: "shutdown".into() }]
        );
    }

    #[test]
    fn test_facade_disagreement_is_reported() {
        let blocking = blocking_surface();
        let mut suspending = blocking.clone();
        suspending.style = CallStyle::Suspending;
        let op = suspending
            .operations
            .iter_mut()
            .find(|op| op.name == "positionsTotal")
            .unwrap();
        op.result = ObservedResult::Absent;

        check_facades_agree(&blocking, &blocking).unwrap();
        let violation = check_facades_agree(&blocking, &suspending).unwrap_err();
        assert!(violation.mentions("positionsTotal"));
    }
}
