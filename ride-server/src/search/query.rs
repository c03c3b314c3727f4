//! The search route's query string.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use url::form_urlencoded;

use crate::domain::parse_date;

/// Most seats a single search can ask for.
pub const MAX_SEATS: u8 = 10;

/// Error parsing a search query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("please choose where you are leaving from")]
    MissingFrom,

    #[error("please choose where you are going")]
    MissingTo,

    #[error("seats must be a number between 1 and 10, got {0:?}")]
    InvalidSeat(String),

    #[error("date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),
}

/// A ride search: route, seat count and optional date.
///
/// Values are trimmed on construction; `from`/`to` are compared
/// case-insensitively by the backend, so they are kept as typed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    from: String,
    to: String,
    seat: u8,
    date: Option<NaiveDate>,
}

impl SearchQuery {
    /// Build a query from already-typed values.
    pub fn new(
        from: &str,
        to: &str,
        seat: u8,
        date: Option<NaiveDate>,
    ) -> Result<Self, QueryError> {
        let from = from.trim();
        let to = to.trim();

        if from.is_empty() {
            return Err(QueryError::MissingFrom);
        }
        if to.is_empty() {
            return Err(QueryError::MissingTo);
        }
        if seat == 0 || seat > MAX_SEATS {
            return Err(QueryError::InvalidSeat(seat.to_string()));
        }

        Ok(Self {
            from: from.to_string(),
            to: to.to_string(),
            seat,
            date,
        })
    }

    /// Parse the search route's query parameters.
    ///
    /// A missing or empty `seat` means one seat and an empty `date` means
    /// any date. Other keys (filter toggles) are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use ride_server::search::SearchQuery;
    ///
    /// let params: HashMap<String, String> = [("from", "Tunis"), ("to", "Sousse")]
    ///     .into_iter()
    ///     .map(|(k, v)| (k.to_string(), v.to_string()))
    ///     .collect();
    ///
    /// let query = SearchQuery::from_params(&params).unwrap();
    /// assert_eq!(query.seat(), 1);
    /// assert_eq!(query.to_query_string(), "from=Tunis&to=Sousse&seat=1");
    /// ```
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, QueryError> {
        let field = |key: &str| params.get(key).map(|v| v.trim()).unwrap_or("");

        let seat = match field("seat") {
            "" => 1,
            raw => raw
                .parse::<u8>()
                .map_err(|_| QueryError::InvalidSeat(raw.to_string()))?,
        };

        let date = match field("date") {
            "" => None,
            raw => Some(parse_date(raw).map_err(|_| QueryError::InvalidDate(raw.to_string()))?),
        };

        Self::new(field("from"), field("to"), seat, date)
    }

    /// Parse a raw query string such as `from=Tunis&to=Sousse&seat=2`.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let params: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self::from_params(&params)
    }

    pub fn from(&self) -> &str {
        &self.from
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn seat(&self) -> u8 {
        self.seat
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Key/value pairs in canonical order: `from`, `to`, `seat`, then `date`
    /// when set.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("from", self.from.clone()),
            ("to", self.to.clone()),
            ("seat", self.seat.to_string()),
        ];
        if let Some(date) = self.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        params
    }

    /// Form-urlencoded query string, the inverse of [`SearchQuery::parse`].
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_params())
            .finish()
    }
}

impl fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchQuery({})", self.to_query_string())
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}
