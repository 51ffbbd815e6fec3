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

//! The gated purchase operation.

use crate::{AdmissionError, AdmissionOrchestrator, AdmissionResult};
use plexgate_stock::StockGuard;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Executes purchases for users the gate has admitted.
///
/// `purchase` is the authorization boundary: only a live processing member
/// may decrement stock. Whatever the decrement's outcome, the completion hook
/// runs, so the freed slot is backfilled on the failure branch too.
pub struct PurchaseService {
    orchestrator: Arc<AdmissionOrchestrator>,
    stock: Arc<dyn StockGuard>,
}

impl PurchaseService {
    /// Wire a purchase service over the orchestrator and the configured
    /// stock guard.
    pub fn new(orchestrator: Arc<AdmissionOrchestrator>, stock: Arc<dyn StockGuard>) -> Self {
        Self {
            orchestrator,
            stock,
        }
    }

    /// Purchase `quantity` units of the resource for an admitted user.
    ///
    /// ## Behavior
    /// 1. Verify live processing membership: a user never promoted (or
    ///    already evicted) fails with
    ///    [`AdmissionError::QueueAccessDenied`], stock untouched.
    /// 2. Run the configured stock guard's decrement.
    /// 3. Always run [`AdmissionOrchestrator::on_purchase_complete`],
    ///    success and failure branch alike, so the slot is released and the
    ///    next waiter admitted.
    ///
    /// A decrement error wins over a cleanup error; a cleanup failure after a
    /// successful decrement is surfaced to the caller.
    #[instrument(skip(self))]
    pub async fn purchase(
        &self,
        resource_id: &str,
        user_id: &str,
        quantity: u32,
    ) -> AdmissionResult<()> {
        if !self.orchestrator.is_in_processing(resource_id, user_id).await? {
            return Err(AdmissionError::QueueAccessDenied {
                resource_id: resource_id.to_string(),
                user_id: user_id.to_string(),
            });
        }

        let outcome = self.stock.decrease(resource_id, quantity).await;
        let cleanup = self
            .orchestrator
            .on_purchase_complete(resource_id, user_id)
            .await;

        match outcome {
            Ok(()) => cleanup,
            Err(stock_err) => {
                if let Err(cleanup_err) = cleanup {
                    warn!(resource_id, user_id, error = %cleanup_err,
                        "purchase cleanup failed after stock error");
                }
                Err(stock_err.into())
            }
        }
    }
}
