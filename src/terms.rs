//! Comma separated term lists turned into rank based weights.

use std::collections::HashMap;

use crate::Error;

/// Separator between terms in the raw input text.
pub const TERM_DELIMITER: char = ',';

/// A single term with its rank derived weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: u32,
}

impl WeightedTerm {
    pub fn new(term: impl Into<String>, weight: u32) -> Self {
        Self {
            term: term.into(),
            weight,
        }
    }
}

/// Ordered term → weight mapping.
///
/// Terms keep the position of their first occurrence. A repeated term does not
/// accumulate: its weight is overwritten by the weight of the later occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermWeights {
    terms: Vec<WeightedTerm>,
}

impl TermWeights {
    /// Splits `text` on commas, trims each token and drops blank ones.
    ///
    /// With `n` surviving tokens, the token at position `i` of the filtered
    /// sequence gets weight `n - i`, so earlier terms weigh strictly more.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let tokens: Vec<&str> = text
            .split(TERM_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let total = tokens.len() as u32;
        let mut weights = Self::default();
        for (idx, token) in tokens.into_iter().enumerate() {
            weights.insert(token, total - idx as u32);
        }

        if weights.is_empty() {
            return Err(Error::Input("term list is empty".into()));
        }
        Ok(weights)
    }

    /// Builds a mapping from explicit pairs, applying the same overwrite rule.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u32)>) -> Result<Self, Error> {
        let mut weights = Self::default();
        for (term, weight) in pairs {
            let term = term.trim();
            if term.is_empty() || weight == 0 {
                continue;
            }
            weights.insert(term, weight);
        }
        if weights.is_empty() {
            return Err(Error::Input("term list is empty".into()));
        }
        Ok(weights)
    }

    fn insert(&mut self, term: &str, weight: u32) {
        match self.terms.iter_mut().find(|t| t.term == term) {
            Some(existing) => existing.weight = weight,
            None => self.terms.push(WeightedTerm::new(term, weight)),
        }
    }

    pub fn get(&self, term: &str) -> Option<u32> {
        self.terms.iter().find(|t| t.term == term).map(|t| t.weight)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedTerm> {
        self.terms.iter()
    }

    pub fn as_slice(&self) -> &[WeightedTerm] {
        &self.terms
    }

    pub fn max_weight(&self) -> u32 {
        self.terms.iter().map(|t| t.weight).max().unwrap_or(0)
    }

    pub fn to_map(&self) -> HashMap<String, u32> {
        self.terms
            .iter()
            .map(|t| (t.term.clone(), t.weight))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_follow_rank() {
        let weights = TermWeights::parse("cat,dog,bird").unwrap();
        assert_eq!(weights.get("cat"), Some(3));
        assert_eq!(weights.get("dog"), Some(2));
        assert_eq!(weights.get("bird"), Some(1));
    }

    #[test]
    fn weights_strictly_decrease_in_order() {
        let weights = TermWeights::parse(" a , b,c ,d,e,f ").unwrap();
        let values: Vec<u32> = weights.iter().map(|t| t.weight).collect();
        assert_eq!(values, vec![6, 5, 4, 3, 2, 1]);
        assert!(values.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn blank_tokens_do_not_consume_rank() {
        let weights = TermWeights::parse("alpha,, ,beta,").unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights.get("alpha"), Some(2));
        assert_eq!(weights.get("beta"), Some(1));
    }

    #[test]
    fn duplicate_term_takes_last_weight() {
        let weights = TermWeights::parse("rust,go,rust,zig").unwrap();
        assert_eq!(weights.len(), 3);
        assert_eq!(weights.get("rust"), Some(2));
        assert_eq!(weights.get("go"), Some(3));
        // first occurrence keeps its slot
        assert_eq!(weights.as_slice()[0].term, "rust");
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(matches!(TermWeights::parse(""), Err(Error::Input(_))));
        assert!(matches!(TermWeights::parse(" , ,, "), Err(Error::Input(_))));
    }

    #[test]
    fn pairs_skip_zero_weights() {
        let weights = TermWeights::from_pairs([("x", 4), ("y", 0), (" ", 3)]).unwrap();
        assert_eq!(weights.len(), 1);
        assert_eq!(weights.max_weight(), 4);
    }
}
