//! Range selection for amount-based transfers.
//!
//! A policy turns "move `amount` units" into concrete spans: whole ranges
//! while the remainder is at least their width, then the lower part of one
//! more range. Splitting only the last range keeps fragmentation to at most
//! one new boundary per transfer.

use std::fmt;

use rangebook_core::Span;

use crate::config::SelectionOrder;

/// Chooses which identifiers an amount-based transfer moves.
pub trait SelectionPolicy: Send + Sync + fmt::Debug {
    /// Pick spans totalling exactly `amount` from `candidates`.
    ///
    /// `candidates` are disjoint and in ascending start order, and their
    /// widths sum to at least `amount`. Each returned span lies inside one
    /// candidate.
    fn select(&self, candidates: &[Span], amount: u64) -> Vec<Span>;
}

/// Consume the highest identifiers first.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestFirst;

impl SelectionPolicy for HighestFirst {
    fn select(&self, candidates: &[Span], amount: u64) -> Vec<Span> {
        take(candidates.iter().rev(), amount)
    }
}

/// Consume the lowest identifiers first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestFirst;

impl SelectionPolicy for LowestFirst {
    fn select(&self, candidates: &[Span], amount: u64) -> Vec<Span> {
        take(candidates.iter(), amount)
    }
}

fn take<'a>(order: impl Iterator<Item = &'a Span>, amount: u64) -> Vec<Span> {
    let mut remaining = amount;
    let mut picked = Vec::new();
    for span in order {
        if remaining == 0 {
            break;
        }
        if span.width() <= remaining {
            remaining -= span.width();
            picked.push(*span);
        } else {
            picked.push(Span::new(span.start, span.start + remaining));
            remaining = 0;
        }
    }
    picked
}

impl SelectionOrder {
    pub fn policy(self) -> Box<dyn SelectionPolicy> {
        match self {
            SelectionOrder::HighestFirst => Box::new(HighestFirst),
            SelectionOrder::LowestFirst => Box::new(LowestFirst),
        }
    }
}
