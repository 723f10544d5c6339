// bridge-common/src/constants.rs
// Terminal enumerations with their native numeric codes

use serde::{Deserialize, Serialize};

/// Chart timeframe, carried over the wire as the terminal's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M10,
    M12,
    M15,
    M20,
    M30,
    H1,
    H2,
    H3,
    H4,
    H6,
    H8,
    H12,
    D1,
    W1,
    MN1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 21] = [
        Timeframe::M1,
        Timeframe::M2,
        Timeframe::M3,
        Timeframe::M4,
        Timeframe::M5,
        Timeframe::M6,
        Timeframe::M10,
        Timeframe::M12,
        Timeframe::M15,
        Timeframe::M20,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H3,
        Timeframe::H4,
        Timeframe::H6,
        Timeframe::H8,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::MN1,
    ];

    pub fn code(self) -> i32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M2 => 2,
            Timeframe::M3 => 3,
            Timeframe::M4 => 4,
            Timeframe::M5 => 5,
            Timeframe::M6 => 6,
            Timeframe::M10 => 10,
            Timeframe::M12 => 12,
            Timeframe::M15 => 15,
            Timeframe::M20 => 20,
            Timeframe::M30 => 30,
            Timeframe::H1 => 16385,
            Timeframe::H2 => 16386,
            Timeframe::H3 => 16387,
            Timeframe::H4 => 16388,
            Timeframe::H6 => 16390,
            Timeframe::H8 => 16392,
            Timeframe::H12 => 16396,
            Timeframe::D1 => 16408,
            Timeframe::W1 => 32769,
            Timeframe::MN1 => 49153,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|tf| tf.code() as i64 == code)
    }

    /// Nominal bar length in seconds. Monthly bars use 30 days.
    pub fn seconds(self) -> i64 {
        let code = self.code();
        match self {
            Timeframe::W1 => 7 * 86_400,
            Timeframe::MN1 => 30 * 86_400,
            _ if code < 16385 => code as i64 * 60,
            _ if code == 16408 => 86_400,
            _ => (code - 16384) as i64 * 3_600,
        }
    }
}

/// `copy_ticks_*` flags.
pub mod copy_ticks {
    pub const ALL: i32 = -1;
    pub const INFO: i32 = 1;
    pub const TRADE: i32 = 2;
}

/// Tick flag bits.
pub mod tick_flag {
    pub const BID: i32 = 2;
    pub const ASK: i32 = 4;
    pub const LAST: i32 = 8;
    pub const VOLUME: i32 = 16;
    pub const BUY: i32 = 32;
    pub const SELL: i32 = 64;
}

macro_rules! coded_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn code(self) -> i32 {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: i64) -> Option<Self> {
                match code {
                    $(c if c == $code as i64 => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

coded_enum!(
    /// `TRADE_ACTION_*`
    TradeAction {
        Deal = 1,
        Pending = 5,
        Sltp = 6,
        Modify = 7,
        Remove = 8,
        CloseBy = 10,
    }
);

coded_enum!(
    /// `ORDER_TYPE_*`
    OrderType {
        Buy = 0,
        Sell = 1,
        BuyLimit = 2,
        SellLimit = 3,
        BuyStop = 4,
        SellStop = 5,
        BuyStopLimit = 6,
        SellStopLimit = 7,
        CloseBy = 8,
    }
);

coded_enum!(
    /// `ORDER_FILLING_*`
    OrderFilling {
        Fok = 0,
        Ioc = 1,
        Return = 2,
    }
);

coded_enum!(
    /// `ORDER_TIME_*`
    OrderTime {
        Gtc = 0,
        Day = 1,
        Specified = 2,
        SpecifiedDay = 3,
    }
);

coded_enum!(
    /// `BOOK_TYPE_*`
    BookType {
        Sell = 1,
        Buy = 2,
        SellMarket = 3,
        BuyMarket = 4,
    }
);

coded_enum!(
    /// `POSITION_TYPE_*`
    PositionType {
        Buy = 0,
        Sell = 1,
    }
);

impl OrderType {
    pub fn is_buy(self) -> bool {
        matches!(
            self,
            OrderType::Buy | OrderType::BuyLimit | OrderType::BuyStop | OrderType::BuyStopLimit
        )
    }

    pub fn is_pending(self) -> bool {
        !matches!(self, OrderType::Buy | OrderType::Sell | OrderType::CloseBy)
    }
}

/// `TRADE_RETCODE_*`
pub mod retcode {
    pub const REQUOTE: u32 = 10004;
    pub const REJECT: u32 = 10006;
    pub const CANCEL: u32 = 10007;
    pub const PLACED: u32 = 10008;
    pub const DONE: u32 = 10009;
    pub const DONE_PARTIAL: u32 = 10010;
    pub const ERROR: u32 = 10011;
    pub const TIMEOUT: u32 = 10012;
    pub const INVALID: u32 = 10013;
    pub const INVALID_VOLUME: u32 = 10014;
    pub const INVALID_PRICE: u32 = 10015;
    pub const INVALID_STOPS: u32 = 10016;
    pub const TRADE_DISABLED: u32 = 10017;
    pub const MARKET_CLOSED: u32 = 10018;
    pub const NO_MONEY: u32 = 10019;
    pub const PRICE_CHANGED: u32 = 10020;
    pub const PRICE_OFF: u32 = 10021;
    pub const INVALID_EXPIRATION: u32 = 10022;
    pub const ORDER_CHANGED: u32 = 10023;
    pub const TOO_MANY_REQUESTS: u32 = 10024;
    pub const NO_CHANGES: u32 = 10025;
    pub const CLIENT_DISABLES_AT: u32 = 10027;
    pub const INVALID_FILL: u32 = 10030;
    pub const CONNECTION: u32 = 10031;
    pub const INVALID_ORDER: u32 = 10035;
    pub const POSITION_CLOSED: u32 = 10036;

    /// Executed fully, placed, or partially filled.
    pub fn is_success(code: u32) -> bool {
        matches!(code, DONE | PLACED | DONE_PARTIAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_codes() {
        assert_eq!(Timeframe::H1.code(), 16385);
        assert_eq!(Timeframe::D1.code(), 16408);
        assert_eq!(Timeframe::MN1.code(), 49153);
        assert_eq!(Timeframe::from_code(16388), Some(Timeframe::H4));
        assert_eq!(Timeframe::from_code(7), None);
    }

    #[test]
    fn test_timeframe_seconds() {
        assert_eq!(Timeframe::M15.seconds(), 900);
        assert_eq!(Timeframe::H4.seconds(), 4 * 3_600);
        assert_eq!(Timeframe::D1.seconds(), 86_400);
    }

    #[test]
    fn test_coded_enums() {
        assert_eq!(TradeAction::from_code(10), Some(TradeAction::CloseBy));
        assert_eq!(OrderType::SellStopLimit.code(), 7);
        assert!(OrderType::BuyLimit.is_pending());
        assert!(!OrderType::Sell.is_buy());
        assert!(retcode::is_success(retcode::DONE_PARTIAL));
        assert!(!retcode::is_success(retcode::REQUOTE));
    }
}
