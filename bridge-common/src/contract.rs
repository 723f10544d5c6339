// bridge-common/src/contract.rs
// ====================================================================
// Operation catalog: 32 operations in 8 categories
// ====================================================================
//
// Every facade is checked against this table. The blocking and the
// suspending catalog are built separately and must agree with each other.

use serde_json::json;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const OPERATION_COUNT: usize = 32;

/// Operations every facade exposes on top of the contract. They are never
/// part of a contract catalog.
pub const BRIDGE_OPERATIONS: [&str; 4] = ["connect", "disconnect", "healthCheck", "isConnected"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallStyle {
    Blocking,
    Suspending,
}

impl fmt::Display for CallStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStyle::Blocking => write!(f, "blocking"),
            CallStyle::Suspending => write!(f, "suspending"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Terminal,
    Symbols,
    MarketData,
    Trading,
    Positions,
    Orders,
    History,
    MarketDepth,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Terminal,
        Category::Symbols,
        Category::MarketData,
        Category::Trading,
        Category::Positions,
        Category::Orders,
        Category::History,
        Category::MarketDepth,
    ];

    /// Number of operations the catalog must hold in this category.
    pub fn expected_count(self) -> usize {
        match self {
            Category::Terminal => 7,
            Category::Symbols => 5,
            Category::MarketData => 5,
            Category::Trading => 4,
            Category::Positions => 2,
            Category::Orders => 2,
            Category::History => 4,
            Category::MarketDepth => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Positional,
    NameOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Str,
    DateTime,
    Timeframe,
    Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Int(i64),
}

impl DefaultValue {
    /// The value a facade must put on the wire when the caller omits it.
    pub fn to_json(self) -> serde_json::Value {
        match self {
            DefaultValue::Null => serde_json::Value::Null,
            DefaultValue::Bool(b) => json!(b),
            DefaultValue::Int(i) => json!(i),
        }
    }
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ValueType,
    pub default: Option<DefaultValue>,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: ValueType) -> Self {
        Self {
            name,
            ty,
            default: None,
            kind: ParamKind::Positional,
        }
    }

    pub const fn optional(name: &'static str, ty: ValueType, default: DefaultValue) -> Self {
        Self {
            name,
            ty,
            default: Some(default),
            kind: ParamKind::Positional,
        }
    }

    pub const fn name_only(name: &'static str, ty: ValueType, default: DefaultValue) -> Self {
        Self {
            name,
            ty,
            default: Some(default),
            kind: ParamKind::NameOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    TerminalInfo,
    AccountInfo,
    SymbolInfo,
    Tick,
    OrderCheckResult,
    OrderResult,
    Position,
    Order,
    Deal,
    BookEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Rates,
    Ticks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Unit,
    Bool,
    Int,
    Float,
    Version,
    ErrorTuple,
    Record(RecordKind),
    Records(RecordKind),
    Series(SeriesKind),
}

/// Whether a result can be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Optionality {
    /// Always present.
    Never,
    /// Absent whenever the terminal has nothing or rejected the call.
    Maybe,
    /// Declared optional, but the terminal never reports absence; a facade
    /// may narrow it to a non-optional result with a zero sentinel.
    Nominal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultShape {
    pub kind: ResultKind,
    pub optionality: Optionality,
}

impl ResultShape {
    pub const fn always(kind: ResultKind) -> Self {
        Self {
            kind,
            optionality: Optionality::Never,
        }
    }

    pub const fn maybe(kind: ResultKind) -> Self {
        Self {
            kind,
            optionality: Optionality::Maybe,
        }
    }

    pub const fn nominal(kind: ResultKind) -> Self {
        Self {
            kind,
            optionality: Optionality::Nominal,
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.optionality {
            Optionality::Never => write!(f, "{:?}", self.kind),
            Optionality::Maybe => write!(f, "{:?}?", self.kind),
            Optionality::Nominal => write!(f, "{:?}?(nominal)", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    /// Wire-level call name.
    pub name: &'static str,
    /// Rust method name on the facades.
    pub method: &'static str,
    pub category: Category,
    pub params: Vec<ParamSpec>,
    pub result: ResultShape,
}

impl OperationSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn param_names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub style: CallStyle,
    pub operations: Vec<OperationSpec>,
}

// Both built-in contracts share one catalog, so checking them as a pair
// only guards hand-built contracts. The two facades themselves are
// compared by observation in `conformance::check_facades_agree`.
impl Contract {
    pub fn blocking() -> Self {
        Self {
            style: CallStyle::Blocking,
            operations: catalog(),
        }
    }

    pub fn suspending() -> Self {
        Self {
            style: CallStyle::Suspending,
            operations: catalog(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.operations.iter().map(|op| op.name).collect()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &OperationSpec> {
        self.operations
            .iter()
            .filter(move |op| op.category == category)
    }
}

// ====================================================================
// CATALOG
// ====================================================================

fn op(
    name: &'static str,
    method: &'static str,
    category: Category,
    params: Vec<ParamSpec>,
    result: ResultShape,
) -> OperationSpec {
    OperationSpec {
        name,
        method,
        category,
        params,
        result,
    }
}

fn catalog() -> Vec<OperationSpec> {
    use Category::*;
    use DefaultValue as D;
    use ParamSpec as P;
    use RecordKind as R;
    use ResultKind as K;
    use ValueType as T;

    let symbol = || P::required("symbol", T::Str);
    let date_from = || P::required("date_from", T::DateTime);
    let date_to = || P::required("date_to", T::DateTime);
    let history_filter = || {
        vec![
            P::name_only("date_from", T::DateTime, D::Null),
            P::name_only("date_to", T::DateTime, D::Null),
            P::name_only("group", T::Str, D::Null),
            P::name_only("ticket", T::Int, D::Null),
            P::name_only("position", T::Int, D::Null),
        ]
    };
    let trade_filter = || {
        vec![
            P::name_only("symbol", T::Str, D::Null),
            P::name_only("group", T::Str, D::Null),
            P::name_only("ticket", T::Int, D::Null),
        ]
    };

    vec![
        // --- terminal ---
        op(
            "initialize",
            "initialize",
            Terminal,
            vec![
                P::optional("path", T::Str, D::Null),
                P::optional("login", T::Int, D::Null),
                P::optional("password", T::Str, D::Null),
                P::optional("server", T::Str, D::Null),
                P::optional("timeout", T::Int, D::Null),
                P::name_only("portable", T::Bool, D::Bool(false)),
            ],
            ResultShape::always(K::Bool),
        ),
        op(
            "login",
            "login",
            Terminal,
            vec![
                P::required("login", T::Int),
                P::optional("password", T::Str, D::Null),
                P::optional("server", T::Str, D::Null),
                P::optional("timeout", T::Int, D::Int(60_000)),
            ],
            ResultShape::always(K::Bool),
        ),
        op("shutdown", "shutdown", Terminal, vec![], ResultShape::always(K::Unit)),
        op("version", "version", Terminal, vec![], ResultShape::maybe(K::Version)),
        op("lastError", "last_error", Terminal, vec![], ResultShape::always(K::ErrorTuple)),
        op(
            "terminalInfo",
            "terminal_info",
            Terminal,
            vec![],
            ResultShape::maybe(K::Record(R::TerminalInfo)),
        ),
        op(
            "accountInfo",
            "account_info",
            Terminal,
            vec![],
            ResultShape::maybe(K::Record(R::AccountInfo)),
        ),
        // --- symbols ---
        op("symbolsTotal", "symbols_total", Symbols, vec![], ResultShape::nominal(K::Int)),
        op(
            "symbolsGet",
            "symbols_get",
            Symbols,
            vec![P::name_only("group", T::Str, D::Null)],
            ResultShape::maybe(K::Records(R::SymbolInfo)),
        ),
        op(
            "symbolInfo",
            "symbol_info",
            Symbols,
            vec![symbol()],
            ResultShape::maybe(K::Record(R::SymbolInfo)),
        ),
        op(
            "symbolInfoTick",
            "symbol_info_tick",
            Symbols,
            vec![symbol()],
            ResultShape::maybe(K::Record(R::Tick)),
        ),
        op(
            "symbolSelect",
            "symbol_select",
            Symbols,
            vec![symbol(), P::name_only("enable", T::Bool, D::Bool(true))],
            ResultShape::always(K::Bool),
        ),
        // --- market data ---
        op(
            "copyRatesFrom",
            "copy_rates_from",
            MarketData,
            vec![
                symbol(),
                P::required("timeframe", T::Timeframe),
                date_from(),
                P::required("count", T::Int),
            ],
            ResultShape::maybe(K::Series(SeriesKind::Rates)),
        ),
        op(
            "copyRatesFromPos",
            "copy_rates_from_pos",
            MarketData,
            vec![
                symbol(),
                P::required("timeframe", T::Timeframe),
                P::required("start_pos", T::Int),
                P::required("count", T::Int),
            ],
            ResultShape::maybe(K::Series(SeriesKind::Rates)),
        ),
        op(
            "copyRatesRange",
            "copy_rates_range",
            MarketData,
            vec![symbol(), P::required("timeframe", T::Timeframe), date_from(), date_to()],
            ResultShape::maybe(K::Series(SeriesKind::Rates)),
        ),
        op(
            "copyTicksFrom",
            "copy_ticks_from",
            MarketData,
            vec![
                symbol(),
                date_from(),
                P::required("count", T::Int),
                P::required("flags", T::Int),
            ],
            ResultShape::maybe(K::Series(SeriesKind::Ticks)),
        ),
        op(
            "copyTicksRange",
            "copy_ticks_range",
            MarketData,
            vec![symbol(), date_from(), date_to(), P::required("flags", T::Int)],
            ResultShape::maybe(K::Series(SeriesKind::Ticks)),
        ),
        // --- trading ---
        op(
            "orderCalcMargin",
            "order_calc_margin",
            Trading,
            vec![
                P::required("action", T::Int),
                symbol(),
                P::required("volume", T::Float),
                P::required("price", T::Float),
            ],
            ResultShape::maybe(K::Float),
        ),
        op(
            "orderCalcProfit",
            "order_calc_profit",
            Trading,
            vec![
                P::required("action", T::Int),
                symbol(),
                P::required("volume", T::Float),
                P::required("price_open", T::Float),
                P::required("price_close", T::Float),
            ],
            ResultShape::maybe(K::Float),
        ),
        op(
            "orderCheck",
            "order_check",
            Trading,
            vec![P::required("request", T::Request)],
            ResultShape::maybe(K::Record(R::OrderCheckResult)),
        ),
        op(
            "orderSend",
            "order_send",
            Trading,
            vec![P::required("request", T::Request)],
            ResultShape::maybe(K::Record(R::OrderResult)),
        ),
        // --- positions ---
        op("positionsTotal", "positions_total", Positions, vec![], ResultShape::nominal(K::Int)),
        op(
            "positionsGet",
            "positions_get",
            Positions,
            trade_filter(),
            ResultShape::maybe(K::Records(R::Position)),
        ),
        // --- orders ---
        op("ordersTotal", "orders_total", Orders, vec![], ResultShape::nominal(K::Int)),
        op(
            "ordersGet",
            "orders_get",
            Orders,
            trade_filter(),
            ResultShape::maybe(K::Records(R::Order)),
        ),
        // --- history ---
        op(
            "historyOrdersTotal",
            "history_orders_total",
            History,
            vec![date_from(), date_to()],
            ResultShape::maybe(K::Int),
        ),
        op(
            "historyOrdersGet",
            "history_orders_get",
            History,
            history_filter(),
            ResultShape::maybe(K::Records(R::Order)),
        ),
        op(
            "historyDealsTotal",
            "history_deals_total",
            History,
            vec![date_from(), date_to()],
            ResultShape::maybe(K::Int),
        ),
        op(
            "historyDealsGet",
            "history_deals_get",
            History,
            history_filter(),
            ResultShape::maybe(K::Records(R::Deal)),
        ),
        // --- market depth ---
        op(
            "marketBookAdd",
            "market_book_add",
            MarketDepth,
            vec![symbol()],
            ResultShape::always(K::Bool),
        ),
        op(
            "marketBookGet",
            "market_book_get",
            MarketDepth,
            vec![symbol()],
            ResultShape::maybe(K::Records(R::BookEntry)),
        ),
        op(
            "marketBookRelease",
            "market_book_release",
            MarketDepth,
            vec![symbol()],
            ResultShape::always(K::Bool),
        ),
    ]
}

// ====================================================================
// VIOLATIONS
// ====================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("{op}: missing operation")]
    MissingOperation { op: String },

    #[error("{op}: operation not in the contract")]
    UnexpectedOperation { op: String },

    #[error("{op}: declared more than once")]
    DuplicateOperation { op: String },

    #[error("{op}: bridge-only operation listed in the contract")]
    BridgeOperationInContract { op: String },

    #[error("expected {expected} operations, found {found}")]
    OperationCount { expected: usize, found: usize },

    #[error("{category:?}: expected {expected} operations, found {found}")]
    CategoryCount {
        category: Category,
        expected: usize,
        found: usize,
    },

    #[error("{op}: category {expected:?} vs {found:?}")]
    CategoryMismatch {
        op: String,
        expected: Category,
        found: Category,
    },

    #[error("{op}: missing parameter `{param}`")]
    MissingParam { op: String, param: String },

    #[error("{op}: parameter order {expected:?} vs {found:?}")]
    ParamOrder {
        op: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{op}: `{param}` should be {expected:?}, is {found:?}")]
    KindMismatch {
        op: String,
        param: String,
        expected: ParamKind,
        found: ParamKind,
    },

    #[error("{op}: `{param}` defaults to {found}, expected {expected}")]
    DefaultMismatch {
        op: String,
        param: String,
        expected: String,
        found: String,
    },

    #[error("{op}: unexpected optional parameter `{param}`")]
    UnexpectedParam { op: String, param: String },

    #[error("{op}: extra required parameter `{param}`")]
    ExtraRequiredParam { op: String, param: String },

    #[error("{op}: result {found} is not compatible with {expected}")]
    ResultShapeMismatch {
        op: String,
        expected: String,
        found: String,
    },
}

/// Every mismatch found while checking one subject.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contract violation in {subject} ({} mismatches): {}", .mismatches.len(), render(.mismatches))]
pub struct ContractViolation {
    pub subject: String,
    pub mismatches: Vec<Mismatch>,
}

fn render(mismatches: &[Mismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ContractViolation {
    /// `Ok(())` when nothing was found.
    pub fn check(subject: impl Into<String>, mismatches: Vec<Mismatch>) -> Result<(), Self> {
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(Self {
                subject: subject.into(),
                mismatches,
            })
        }
    }

    pub fn mentions(&self, op: &str) -> bool {
        self.mismatches.iter().any(|m| m.to_string().starts_with(&format!("{}:", op)))
    }
}

// ====================================================================
// CATALOG-LEVEL CHECKS
// ====================================================================

/// Structural sanity of one catalog.
pub fn validate_contract(contract: &Contract) -> Result<(), ContractViolation> {
    let mut found = Vec::new();

    if contract.operations.len() != OPERATION_COUNT {
        found.push(Mismatch::OperationCount {
            expected: OPERATION_COUNT,
            found: contract.operations.len(),
        });
    }

    let mut seen = HashSet::new();
    for spec in &contract.operations {
        if !seen.insert(spec.name) {
            found.push(Mismatch::DuplicateOperation {
                op: spec.name.to_string(),
            });
        }
        if BRIDGE_OPERATIONS.contains(&spec.name) {
            found.push(Mismatch::BridgeOperationInContract {
                op: spec.name.to_string(),
            });
        }
        let mut params = HashSet::new();
        for p in &spec.params {
            if !params.insert(p.name) {
                found.push(Mismatch::ParamOrder {
                    op: spec.name.to_string(),
                    expected: vec![p.name.to_string()],
                    found: spec.param_names().iter().map(|s| s.to_string()).collect(),
                });
            }
            if p.kind == ParamKind::NameOnly && p.default.is_none() {
                found.push(Mismatch::ExtraRequiredParam {
                    op: spec.name.to_string(),
                    param: p.name.to_string(),
                });
            }
        }
    }

    for category in Category::ALL {
        let count = contract.in_category(category).count();
        if count != category.expected_count() {
            found.push(Mismatch::CategoryCount {
                category,
                expected: category.expected_count(),
                found: count,
            });
        }
    }

    ContractViolation::check(format!("{} contract", contract.style), found)
}

/// The blocking and suspending catalogs must describe the same surface.
pub fn check_contract_pair(blocking: &Contract, suspending: &Contract) -> Result<(), ContractViolation> {
    let mut found = Vec::new();

    for left in &blocking.operations {
        let Some(right) = suspending.lookup(left.name) else {
            found.push(Mismatch::MissingOperation {
                op: left.name.to_string(),
            });
            continue;
        };
        if left.category != right.category {
            found.push(Mismatch::CategoryMismatch {
                op: left.name.to_string(),
                expected: left.category,
                found: right.category,
            });
        }
        compare_params(left, &right.params, &mut found);
        if left.result != right.result {
            found.push(Mismatch::ResultShapeMismatch {
                op: left.name.to_string(),
                expected: left.result.to_string(),
                found: right.result.to_string(),
            });
        }
    }
    for right in &suspending.operations {
        if blocking.lookup(right.name).is_none() {
            found.push(Mismatch::UnexpectedOperation {
                op: right.name.to_string(),
            });
        }
    }

    ContractViolation::check("blocking vs suspending contract", found)
}

/// What the parameter comparison needs to know about one parameter, whether
/// it comes from a catalog or was observed on the wire.
pub trait ParamShape {
    fn name(&self) -> &str;
    fn kind(&self) -> ParamKind;
    /// The value sent when the caller omits the parameter; `None` if required.
    fn default_json(&self) -> Option<serde_json::Value>;

    fn is_required(&self) -> bool {
        self.default_json().is_none()
    }
}

impl ParamShape for ParamSpec {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ParamKind {
        self.kind
    }

    fn default_json(&self) -> Option<serde_json::Value> {
        self.default.map(DefaultValue::to_json)
    }
}

/// Compares a declared parameter list against another one (declared or
/// observed). Shared by the contract-pair and the facade checks.
pub fn compare_params<P: ParamShape>(expected: &OperationSpec, actual: &[P], found: &mut Vec<Mismatch>) {
    compare_param_lists(expected.name, &expected.params, actual, found)
}

pub fn compare_param_lists<E: ParamShape, A: ParamShape>(
    op: &str,
    expected: &[E],
    actual: &[A],
    found: &mut Vec<Mismatch>,
) {
    for want in expected {
        match actual.iter().find(|p| p.name() == want.name()) {
            None => found.push(Mismatch::MissingParam {
                op: op.to_string(),
                param: want.name().to_string(),
            }),
            Some(have) => {
                if have.kind() != want.kind() {
                    found.push(Mismatch::KindMismatch {
                        op: op.to_string(),
                        param: want.name().to_string(),
                        expected: want.kind(),
                        found: have.kind(),
                    });
                }
                let (want_default, have_default) = (want.default_json(), have.default_json());
                if want_default != have_default {
                    found.push(Mismatch::DefaultMismatch {
                        op: op.to_string(),
                        param: want.name().to_string(),
                        expected: describe_default(want_default),
                        found: describe_default(have_default),
                    });
                }
            }
        }
    }

    for have in actual {
        if expected.iter().any(|p| p.name() == have.name()) {
            continue;
        }
        let (op, param) = (op.to_string(), have.name().to_string());
        found.push(if have.is_required() {
            Mismatch::ExtraRequiredParam { op, param }
        } else {
            Mismatch::UnexpectedParam { op, param }
        });
    }

    let shared_expected: Vec<&str> = expected
        .iter()
        .map(|p| p.name())
        .filter(|n| actual.iter().any(|p| p.name() == *n))
        .collect();
    let shared_actual: Vec<&str> = actual
        .iter()
        .map(|p| p.name())
        .filter(|n| expected.iter().any(|p| p.name() == *n))
        .collect();
    if shared_expected != shared_actual {
        found.push(Mismatch::ParamOrder {
            op: op.to_string(),
            expected: expected.iter().map(|p| p.name().to_string()).collect(),
            found: actual.iter().map(|p| p.name().to_string()).collect(),
        });
    }
}

fn describe_default(default: Option<serde_json::Value>) -> String {
    match default {
        Some(d) => d.to_string(),
        None => "<required>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_valid() {
        validate_contract(&Contract::blocking()).unwrap();
        validate_contract(&Contract::suspending()).unwrap();
    }

    #[test]
    fn test_catalog_counts() {
        let contract = Contract::blocking();
        assert_eq!(contract.operations.len(), OPERATION_COUNT);
        let total: usize = Category::ALL.iter().map(|c| c.expected_count()).sum();
        assert_eq!(total, OPERATION_COUNT);
        assert_eq!(contract.in_category(Category::History).count(), 4);
    }

    #[test]
    fn test_pair_agrees() {
        check_contract_pair(&Contract::blocking(), &Contract::suspending()).unwrap();
    }

    #[test]
    fn test_name_only_flags() {
        let contract = Contract::blocking();
        let portable = contract.lookup("initialize").unwrap().param("portable").unwrap();
        assert_eq!(portable.kind, ParamKind::NameOnly);
        assert_eq!(portable.default, Some(DefaultValue::Bool(false)));

        let enable = contract.lookup("symbolSelect").unwrap().param("enable").unwrap();
        assert_eq!(enable.kind, ParamKind::NameOnly);
        assert_eq!(enable.default, Some(DefaultValue::Bool(true)));

        let timeout = contract.lookup("login").unwrap().param("timeout").unwrap();
        assert_eq!(timeout.default, Some(DefaultValue::Int(60_000)));
    }

    #[test]
    fn test_bridge_operations_excluded() {
        let contract = Contract::blocking();
        for name in BRIDGE_OPERATIONS {
            assert!(contract.lookup(name).is_none());
        }
    }

    #[test]
    fn test_pair_divergence_is_reported() {
        let blocking = Contract::blocking();
        let mut suspending = Contract::suspending();

        let select = suspending
            .operations
            .iter_mut()
            .find(|op| op.name == "symbolSelect")
            .unwrap();
        select.params[1].kind = ParamKind::Positional;
        suspending.operations.retain(|op| op.name != "ordersTotal");

        let violation = check_contract_pair(&blocking, &suspending).unwrap_err();
        assert!(violation.mismatches.contains(&Mismatch::MissingOperation {
            op: "ordersTotal".into()
        }));
        assert!(violation.mismatches.iter().any(|m| matches!(
            m,
            Mismatch::KindMismatch { op, param, .. } if op == "symbolSelect" && param == "enable"
        )));
        assert!(violation.to_string().contains("2 mismatches"));
    }

    #[test]
    fn test_broken_catalog_is_reported() {
        let mut contract = Contract::blocking();
        let dup = contract.operations[0].clone();
        contract.operations.push(dup);
        let violation = validate_contract(&contract).unwrap_err();
        assert!(violation.mismatches.contains(&Mismatch::DuplicateOperation {
            op: "initialize".into()
        }));
        assert!(violation.mismatches.iter().any(|m| matches!(
            m,
            Mismatch::CategoryCount { category: Category::Terminal, found: 8, .. }
        )));
    }

    #[test]
    fn test_extra_and_reordered_params() {
        let spec = Contract::blocking().lookup("copyRatesRange").unwrap().clone();
        let mut actual = spec.params.clone();
        actual.swap(2, 3);
        actual.push(ParamSpec::required("strict", ValueType::Bool));

        let mut found = Vec::new();
        compare_params(&spec, &actual, &mut found);
        assert!(found.iter().any(|m| matches!(m, Mismatch::ParamOrder { .. })));
        assert!(found.contains(&Mismatch::ExtraRequiredParam {
            op: "copyRatesRange".into(),
            param: "strict".into()
        }));
    }
}
