// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of PlexGate.
//
// PlexGate is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// PlexGate is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with PlexGate. If not, see <https://www.gnu.org/licenses/>.

//! The stock record and its domain rules.

use crate::{StockError, StockResult};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Per-resource counter of sellable units.
///
/// Invariants: `0 <= remaining_quantity <= total_quantity` always holds;
/// `remaining_quantity` only ever decreases; `version` increments on every
/// successful mutation (the optimistic strategy's conflict detector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Record identity
    pub id: String,
    /// Resource the stock belongs to
    pub resource_id: String,
    /// Units the sale opened with
    pub total_quantity: u32,
    /// Units still available
    pub remaining_quantity: u32,
    /// Mutation counter for optimistic conflict detection
    pub version: u64,
}

impl StockRecord {
    /// Create a full, unsold record for a resource.
    pub fn new(resource_id: &str, total_quantity: u32) -> Self {
        Self {
            id: Ulid::new().to_string(),
            resource_id: resource_id.to_string(),
            total_quantity,
            remaining_quantity: total_quantity,
            version: 0,
        }
    }

    /// Apply a decrement in place, bumping the version.
    ///
    /// ## Errors
    /// - [`StockError::InvalidQuantity`]: `quantity` is zero
    /// - [`StockError::InsufficientStock`]: `quantity` exceeds what remains;
    ///   the record is left unchanged
    pub fn decrease(&mut self, quantity: u32) -> StockResult<()> {
        if quantity == 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        if self.remaining_quantity < quantity {
            return Err(StockError::InsufficientStock {
                remaining: self.remaining_quantity,
                requested: quantity,
            });
        }
        self.remaining_quantity -= quantity;
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_full() {
        let record = StockRecord::new("c1", 50);
        assert_eq!(record.resource_id, "c1");
        assert_eq!(record.total_quantity, 50);
        assert_eq!(record.remaining_quantity, 50);
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_decrease_updates_remaining_and_version() {
        let mut record = StockRecord::new("c1", 50);
        record.decrease(20).unwrap();
        assert_eq!(record.remaining_quantity, 30);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn test_decrease_rejects_zero_quantity() {
        let mut record = StockRecord::new("c1", 50);
        assert!(matches!(
            record.decrease(0),
            Err(StockError::InvalidQuantity(0))
        ));
        assert_eq!(record.remaining_quantity, 50);
    }

    #[test]
    fn test_decrease_rejects_overdraw_and_leaves_record_unchanged() {
        let mut record = StockRecord::new("c1", 5);
        let err = record.decrease(6).unwrap_err();
        assert!(matches!(
            err,
            StockError::InsufficientStock {
                remaining: 5,
                requested: 6
            }
        ));
        assert_eq!(record.remaining_quantity, 5);
        assert_eq!(record.version, 0);
    }

    #[test]
    fn test_decrease_to_exactly_zero() {
        let mut record = StockRecord::new("c1", 5);
        record.decrease(5).unwrap();
        assert_eq!(record.remaining_quantity, 0);
        assert!(record.decrease(1).is_err());
    }
}
