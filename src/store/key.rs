//! Identity keys for collected articles.
//!
//! A key is the pair (customer name, ordinal in that customer's unfiltered
//! list). It is never serialized into a delimited string, so customer names
//! may contain any character.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleKey {
    pub customer: String,
    pub ordinal: usize,
}

impl ArticleKey {
    #[must_use]
    pub fn new(customer: impl Into<String>, ordinal: usize) -> Self {
        Self {
            customer: customer.into(),
            ordinal,
        }
    }
}

impl fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.customer, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_separator_in_name_stay_distinct() {
        let a = ArticleKey::new("Acme_1", 0);
        let b = ArticleKey::new("Acme", 10);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Acme_1#0");
    }

    #[test]
    fn keys_order_by_customer_then_ordinal() {
        let mut keys = vec![
            ArticleKey::new("Globex", 0),
            ArticleKey::new("Acme", 1),
            ArticleKey::new("Acme", 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ArticleKey::new("Acme", 0),
                ArticleKey::new("Acme", 1),
                ArticleKey::new("Globex", 0),
            ]
        );
    }
}
