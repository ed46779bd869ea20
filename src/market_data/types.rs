use std::collections::HashMap;

use crate::state::asset::{NewsItem, SourceRef};

/// Transient merge product of one refresh cycle: normalized symbol key
/// to proposed positive price. Lives only until `apply_price_updates`
/// consumes it.
pub type PriceUpdates = HashMap<String, f64>;

/// Everything one bulk fetch delivers: a (possibly partial or empty)
/// price mapping plus the editorial payload that rides along with it.
#[derive(Debug, Clone, Default)]
pub struct BulkMarketData {
    pub prices: PriceUpdates,
    pub news: Vec<NewsItem>,
    pub sources: Vec<SourceRef>,
}

/// Coarse history window accepted by the historical source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
    OneYear,
}

impl Range {
    /// Wire token for the chart endpoint.
    pub fn as_token(self) -> &'static str {
        match self {
            Range::OneDay => "1d",
            Range::OneWeek => "5d",
            Range::OneMonth => "1mo",
            Range::ThreeMonths => "3mo",
            Range::OneYear => "1y",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_tokens_match_the_chart_endpoint_vocabulary() {
        assert_eq!(Range::OneDay.as_token(), "1d");
        assert_eq!(Range::OneWeek.as_token(), "5d");
        assert_eq!(Range::OneMonth.as_token(), "1mo");
        assert_eq!(Range::ThreeMonths.as_token(), "3mo");
        assert_eq!(Range::OneYear.as_token(), "1y");
    }
}
