//! Daily USD to Bolívar conversion rate, used purely as a display multiplier.
//!
//! The rate source returns a large JSON document; only `monitors.bcv.price`
//! is consumed. Every nesting level is optional-tolerant: a missing or
//! malformed rate degrades to "no secondary currency shown", never an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Daily snapshot from the conversion rate source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionRate {
    #[serde(default)]
    pub datetime: Option<RateDatetime>,
    #[serde(default)]
    pub monitors: Option<Monitors>,
}

/// Date and time the snapshot was taken, as reported by the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateDatetime {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

/// Monitor block; only the BCV monitor is consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Monitors {
    #[serde(default)]
    pub bcv: Option<BcvMonitor>,
}

/// The BCV (central bank) monitor. The source publishes many more fields
/// (change, percent, color, ...); they are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BcvMonitor {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub last_update: Option<String>,
}

impl ConversionRate {
    /// The usable BCV rate, if any.
    ///
    /// `None` when any nesting level is absent or the price is not a
    /// positive number; callers must then omit all secondary-currency
    /// figures rather than showing zero or a stale value.
    #[must_use]
    pub fn bcv_price(&self) -> Option<Decimal> {
        self.monitors
            .as_ref()?
            .bcv
            .as_ref()?
            .price
            .filter(|p| p.is_sign_positive() && !p.is_zero())
    }

    /// Convert a USD amount to Bolívares at the BCV rate, rounded to two
    /// decimal places. `None` when no usable rate is available.
    #[must_use]
    pub fn in_bolivares(&self, amount: Decimal) -> Option<Decimal> {
        self.bcv_price().map(|rate| (amount * rate).round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rate(price: &str) -> ConversionRate {
        ConversionRate {
            datetime: None,
            monitors: Some(Monitors {
                bcv: Some(BcvMonitor {
                    price: Some(price.parse().unwrap()),
                    last_update: None,
                }),
            }),
        }
    }

    #[test]
    fn test_scenario_b_secondary_total() {
        // 21.50 USD at 40.0 Bs/USD = 860.00 Bs
        let r = rate("40.0");
        let bs = r.in_bolivares("21.50".parse().unwrap()).unwrap();
        assert_eq!(bs, "860.00".parse().unwrap());
    }

    #[test]
    fn test_absent_rate_degrades_to_none() {
        let empty = ConversionRate::default();
        assert!(empty.bcv_price().is_none());
        assert!(empty.in_bolivares(Decimal::TEN).is_none());

        let no_bcv = ConversionRate {
            datetime: None,
            monitors: Some(Monitors { bcv: None }),
        };
        assert!(no_bcv.bcv_price().is_none());
    }

    #[test]
    fn test_zero_and_negative_rates_are_unusable() {
        assert!(rate("0").bcv_price().is_none());
        assert!(rate("-40").bcv_price().is_none());
    }

    #[test]
    fn test_deserializes_source_document() {
        let json = r#"{
            "datetime": {"date": "miercoles, 27 de agosto", "time": "10:00"},
            "monitors": {
                "bcv": {
                    "change": 0.5, "color": "green", "image": "x",
                    "last_update": "27/08/2025", "percent": 0.3,
                    "price": 40.0, "price_old": 39.5,
                    "symbol": "Bs", "title": "BCV"
                }
            }
        }"#;
        let r: ConversionRate = serde_json::from_str(json).unwrap();
        assert_eq!(r.bcv_price().unwrap(), Decimal::from(40));
    }

    #[test]
    fn test_deserializes_partial_document() {
        let r: ConversionRate = serde_json::from_str("{}").unwrap();
        assert!(r.bcv_price().is_none());

        let r: ConversionRate = serde_json::from_str(r#"{"monitors":{}}"#).unwrap();
        assert!(r.bcv_price().is_none());
    }
}
