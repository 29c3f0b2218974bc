//! Static reference configuration
//!
//! Exchange metadata and defaults consulted when creating records whose
//! source data carried no value (e.g. currency). Scraped data always wins
//! over these defaults.

use chrono_tz::Tz;

/// User agent sent with every fetch; some exchange sites reject blank agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Per-request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Records per commit when loading large batches.
pub const LOAD_BATCH_SIZE: usize = 100;

/// Static metadata for a supported exchange.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub currency: &'static str,
    pub url: &'static str,
    pub timezone: &'static str,
}

/// The three supported exchanges.
pub const EXCHANGES: &[ExchangeInfo] = &[
    ExchangeInfo {
        code: "JSE",
        name: "Johannesburg Stock Exchange",
        country: "South Africa",
        currency: "ZAR",
        url: "https://www.jse.co.za",
        timezone: "Africa/Johannesburg",
    },
    ExchangeInfo {
        code: "NGX",
        name: "Nigerian Exchange Group",
        country: "Nigeria",
        currency: "NGN",
        url: "https://ngxgroup.com",
        timezone: "Africa/Lagos",
    },
    ExchangeInfo {
        code: "BRVM",
        name: "Bourse Régionale des Valeurs Mobilières",
        country: "West Africa",
        currency: "XOF",
        url: "https://www.brvm.org",
        timezone: "Africa/Abidjan",
    },
];

/// Look up static exchange metadata by code.
pub fn exchange_info(code: &str) -> Option<&'static ExchangeInfo> {
    let code = code.trim().to_uppercase();
    EXCHANGES.iter().find(|e| e.code == code)
}

/// Default trading currency for an exchange, USD for unknown codes.
pub fn default_currency(exchange_code: &str) -> &'static str {
    exchange_info(exchange_code).map_or("USD", |e| e.currency)
}

/// All configured exchange codes, in scheduling order.
pub fn exchange_codes() -> Vec<&'static str> {
    EXCHANGES.iter().map(|e| e.code).collect()
}

/// Timezone an exchange trades in, UTC if the name is unknown.
pub fn exchange_timezone(code: &str) -> Tz {
    exchange_info(code)
        .and_then(|e| e.timezone.parse().ok())
        .unwrap_or(chrono_tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_lookup_is_case_insensitive() {
        assert_eq!(exchange_info("jse").unwrap().currency, "ZAR");
        assert_eq!(exchange_info(" Ngx ").unwrap().currency, "NGN");
        assert!(exchange_info("NYSE").is_none());
    }

    #[test]
    fn test_default_currency_falls_back_to_usd() {
        assert_eq!(default_currency("BRVM"), "XOF");
        assert_eq!(default_currency("LSE"), "USD");
    }

    #[test]
    fn test_exchange_timezones_resolve() {
        assert_eq!(exchange_timezone("JSE"), chrono_tz::Africa::Johannesburg);
        assert_eq!(exchange_timezone("unknown"), chrono_tz::UTC);
    }
}
