//! Slash dispatch
//!
//! ```text
//! slash_vault(t, vault, subnetwork, operator, amount)
//!   vault usable by operator?           -> NotOperatorVault
//!   vault active for operator at t?     -> InactiveVaultSlash
//!   t + slashing_window >= now?         -> TooOldTimestampSlash
//!   vault has a slasher?                -> NoSlasher
//!   TYPE() == 0 -> slash            (SlashOutcome::Slashed)
//!   TYPE() == 1 -> request_slash    (SlashOutcome::Requested)
//!   otherwise                           -> UnknownSlasherType
//! ```
//!
//! The membership read lock is held for the whole dispatch so the vault
//! cannot be unregistered between the checks and the slasher call.

use super::service::MiddlewareService;
use crate::domain::{
    Address, MiddlewareError, MiddlewareResult, SlashOutcome, SlashResponse, SlasherVariant,
    SubnetworkId, Timestamp, U256,
};
use crate::metrics;
use crate::ports::{CollateralGateway, DelegatorGateway, SlasherGateway, StakePowerPolicy};
use tracing::{info, warn};

impl<C, D, S, P> MiddlewareService<C, D, S, P>
where
    C: CollateralGateway,
    D: DelegatorGateway,
    S: SlasherGateway,
    P: StakePowerPolicy,
{
    /// Slash `operator` through `vault` for misbehavior at `timestamp`.
    pub fn slash_vault(
        &self,
        timestamp: Timestamp,
        vault: Address,
        subnetwork: SubnetworkId,
        operator: Address,
        amount: U256,
        hints: &[u8],
    ) -> MiddlewareResult<SlashResponse> {
        match self.dispatch_slash(timestamp, vault, subnetwork, operator, amount, hints) {
            Ok(response) => {
                info!(
                    ?operator,
                    ?vault,
                    %subnetwork,
                    timestamp,
                    %amount,
                    variant = response.slasher_variant.as_str(),
                    outcome = ?response.outcome,
                    "Slash dispatched"
                );
                metrics::record_slash(response.slasher_variant.as_str());
                Ok(response)
            }
            Err(err) => {
                warn!(
                    ?operator,
                    ?vault,
                    timestamp,
                    reason = err.reason(),
                    "Slash rejected: {}",
                    err
                );
                metrics::record_slash_rejected(err.reason());
                Err(err)
            }
        }
    }

    /// Execute a queued veto slash on the slasher of `vault`.
    pub fn execute_slash(
        &self,
        vault: Address,
        request_index: u64,
        hints: &[u8],
    ) -> MiddlewareResult<U256> {
        match self.dispatch_execute(vault, request_index, hints) {
            Ok(slashed) => {
                info!(?vault, request_index, %slashed, "Veto slash executed");
                Ok(slashed)
            }
            Err(err) => {
                warn!(
                    ?vault,
                    request_index,
                    reason = err.reason(),
                    "Slash execution rejected: {}",
                    err
                );
                metrics::record_slash_rejected(err.reason());
                Err(err)
            }
        }
    }

    fn dispatch_execute(
        &self,
        vault: Address,
        request_index: u64,
        hints: &[u8],
    ) -> MiddlewareResult<U256> {
        let slasher = self
            .collateral
            .slasher(&vault)?
            .ok_or(MiddlewareError::NoSlasher(vault))?;
        if self.slasher_variant(&slasher)? != SlasherVariant::Veto {
            return Err(MiddlewareError::NonVetoSlasher(vault));
        }

        Ok(self.slashers.execute_slash(&slasher, request_index, hints)?)
    }

    fn dispatch_slash(
        &self,
        timestamp: Timestamp,
        vault: Address,
        subnetwork: SubnetworkId,
        operator: Address,
        amount: U256,
        hints: &[u8],
    ) -> MiddlewareResult<SlashResponse> {
        let registry = self.state.membership.read();

        if !registry.is_operator_vault(&operator, &vault) {
            return Err(MiddlewareError::NotOperatorVault { operator, vault });
        }
        if !registry.vault_was_active_at(timestamp, &operator, &vault) {
            return Err(MiddlewareError::InactiveVaultSlash {
                operator,
                vault,
                timestamp,
            });
        }

        let now = self.now();
        let slashing_window = self.config.slashing_window;
        if timestamp.saturating_add(slashing_window) < now {
            return Err(MiddlewareError::TooOldTimestampSlash {
                timestamp,
                slashing_window,
                now,
            });
        }

        let slasher = self
            .collateral
            .slasher(&vault)?
            .ok_or(MiddlewareError::NoSlasher(vault))?;
        let slasher_variant = self.slasher_variant(&slasher)?;
        let outcome = match slasher_variant {
            SlasherVariant::Instant => SlashOutcome::Slashed(self.slashers.slash(
                &slasher,
                &subnetwork,
                &operator,
                amount,
                timestamp,
                hints,
            )?),
            SlasherVariant::Veto => SlashOutcome::Requested(self.slashers.request_slash(
                &slasher,
                &subnetwork,
                &operator,
                amount,
                timestamp,
                hints,
            )?),
            SlasherVariant::Unknown(tag) => {
                return Err(MiddlewareError::UnknownSlasherType(tag));
            }
        };

        Ok(SlashResponse {
            vault,
            slasher_variant,
            subnetwork,
            outcome,
        })
    }
}
