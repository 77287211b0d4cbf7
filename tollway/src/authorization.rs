//! Construction of `TransferWithAuthorization` messages.
//!
//! Every built [`Authorization`] has `validAfter = 0`, `validBefore = now + 60`
//! and a fresh 32-byte nonce from the thread-local CSPRNG. The window is not
//! configurable.

use alloy_primitives::{Address, B256};
use rand::RngExt;
use rand::rng;

use crate::amount::{AmountParseError, TokenAmount};
use crate::error::X402Error;
use crate::proto::{Authorization, EXACT_SCHEME, PaymentRequirements};
use crate::timestamp::UnixTimestamp;

/// Lifetime of a built authorization, in seconds.
pub const VALIDITY_WINDOW_SECS: u64 = 60;

/// Builds one [`Authorization`] for a requirement.
///
/// # Example
///
/// ```
/// # use tollway::authorization::AuthorizationBuilder;
/// # fn demo(req: &tollway::proto::PaymentRequirements, payer: alloy_primitives::Address)
/// #     -> Result<(), tollway::X402Error> {
/// let auth = AuthorizationBuilder::new(req, payer).build()?;
/// assert_eq!(auth.value, req.max_amount_required);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AuthorizationBuilder<'a> {
    requirement: &'a PaymentRequirements,
    payer: Address,
    amount: Option<String>,
}

impl<'a> AuthorizationBuilder<'a> {
    /// Starts a builder for `payer` paying `requirement`.
    #[must_use]
    pub const fn new(requirement: &'a PaymentRequirements, payer: Address) -> Self {
        Self {
            requirement,
            payer,
            amount: None,
        }
    }

    /// Pays `amount` instead of `maxAmountRequired`.
    ///
    /// The override must be a canonical unsigned integer no greater than the
    /// required maximum; this is checked by [`build`](Self::build).
    #[must_use]
    pub fn with_amount(mut self, amount: Option<impl Into<String>>) -> Self {
        self.amount = amount.map(Into::into);
        self
    }

    /// Builds the authorization against the current clock.
    ///
    /// # Errors
    ///
    /// [`X402Error::MalformedChallenge`] for a scheme other than `exact`,
    /// [`X402Error::InvalidAmount`] for an unacceptable override.
    pub fn build(&self) -> Result<Authorization, X402Error> {
        self.build_at(UnixTimestamp::now())
    }

    /// Builds the authorization as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_at(&self, now: UnixTimestamp) -> Result<Authorization, X402Error> {
        if self.requirement.scheme != EXACT_SCHEME {
            return Err(X402Error::MalformedChallenge(format!(
                "unsupported scheme {:?}",
                self.requirement.scheme
            )));
        }
        let value = self.amount()?;
        let nonce: [u8; 32] = rng().random();

        let authorization = Authorization {
            from: self.payer,
            to: self.requirement.pay_to,
            value,
            valid_after: UnixTimestamp::EPOCH,
            valid_before: now + VALIDITY_WINDOW_SECS,
            nonce: B256::from(nonce),
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(
            from = %authorization.from,
            to = %authorization.to,
            value = %authorization.value,
            valid_before = %authorization.valid_before,
            "built authorization"
        );

        Ok(authorization)
    }

    fn amount(&self) -> Result<TokenAmount, X402Error> {
        let max = self.requirement.max_amount_required;
        let Some(raw) = &self.amount else {
            return Ok(max);
        };
        let amount: TokenAmount = raw.parse().map_err(|e: AmountParseError| {
            X402Error::InvalidAmount {
                amount: raw.clone(),
                reason: e.to_string(),
            }
        })?;
        if amount > max {
            return Err(X402Error::InvalidAmount {
                amount: raw.clone(),
                reason: format!("exceeds maxAmountRequired {max}"),
            });
        }
        Ok(amount)
    }
}
