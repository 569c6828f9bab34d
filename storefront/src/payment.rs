//! Payment methods, fee calculation and the mock payment gateway.
//!
//! Nothing here talks to a real payment provider. [`MockPaymentGateway`]
//! waits for a simulated processing delay and then approves the charge (or
//! declines it, when configured to), which is enough to drive the checkout
//! flow end to end.

use crate::types::Money;
use chrono::{DateTime, Utc};
use keystore_core::environment::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Payment gateway result
pub type GatewayResult<T> = Result<T, PaymentError>;

/// Payment errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PaymentError {
    /// The provider declined the charge
    #[error("Payment declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },
    /// Card payments need card details
    #[error("Card details are required for card payments")]
    MissingCard,
    /// Card details failed validation
    #[error("Invalid card: {0}")]
    InvalidCard(String),
    /// Unknown payment method id
    #[error("Unknown payment method: {0}")]
    UnknownMethod(String),
}

// ============================================================================
// Payment methods
// ============================================================================

/// Supported payment methods
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Faster Payments System (СБП), paid by scanning a QR code
    #[default]
    Sbp,
    /// Bank card
    Card,
    /// `YooMoney` wallet
    YooMoney,
    /// Tinkoff bank payments
    Tinkoff,
    /// QIWI wallet
    Qiwi,
    /// `WebMoney` wallet
    WebMoney,
}

impl PaymentMethod {
    /// Every method in display order
    pub const ALL: [Self; 6] = [
        Self::Sbp,
        Self::Card,
        Self::YooMoney,
        Self::Tinkoff,
        Self::Qiwi,
        Self::WebMoney,
    ];

    /// Stable identifier used in requests
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Sbp => "sbp",
            Self::Card => "card",
            Self::YooMoney => "yoomoney",
            Self::Tinkoff => "tinkoff",
            Self::Qiwi => "qiwi",
            Self::WebMoney => "webmoney",
        }
    }

    /// Display name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sbp => "Система быстрых платежей",
            Self::Card => "Банковская карта",
            Self::YooMoney => "ЮMoney",
            Self::Tinkoff => "Тинькофф Платежи",
            Self::Qiwi => "QIWI Кошелек",
            Self::WebMoney => "WebMoney",
        }
    }

    /// One-line description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Sbp => "Моментальный перевод через СБП",
            Self::Card => "Visa, MasterCard, МИР",
            Self::YooMoney => "Электронный кошелек",
            Self::Tinkoff => "Прямая интеграция с банком",
            Self::Qiwi => "Оплата через QIWI",
            Self::WebMoney => "Электронная валюта",
        }
    }

    /// Commission in basis points (250 = 2.5%)
    #[must_use]
    pub const fn fee_bps(self) -> u32 {
        match self {
            Self::Sbp => 0,
            Self::Card => 250,
            Self::YooMoney => 300,
            Self::Tinkoff => 150,
            Self::Qiwi => 290,
            Self::WebMoney => 80,
        }
    }

    /// Highlighted as the recommended method
    #[must_use]
    pub const fn is_popular(self) -> bool {
        matches!(self, Self::Sbp)
    }

    /// Whether the charge needs card details
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::Card)
    }

    /// Commission charged on `amount`
    #[must_use]
    pub fn fee(self, amount: Money) -> Money {
        amount.basis_points(self.fee_bps())
    }

    /// `amount` plus the commission
    #[must_use]
    pub fn total_with_fee(self, amount: Money) -> Money {
        amount.saturating_add(self.fee(amount))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PaymentError::UnknownMethod(s.to_string()))
    }
}

// ============================================================================
// Cards
// ============================================================================

/// Card details entered at checkout
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    /// Card number, spaces allowed
    pub number: String,
    /// Expiry as `MM/YY`
    #[serde(default)]
    pub expiry: String,
    /// Security code
    #[serde(default)]
    pub cvv: String,
    /// Cardholder name
    #[serde(default)]
    pub holder: String,
}

impl CardDetails {
    fn digits(&self) -> String {
        self.number.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Last four digits of the number
    #[must_use]
    pub fn last_four(&self) -> String {
        let digits = self.digits();
        let skip = digits.chars().count().saturating_sub(4);
        digits.chars().skip(skip).collect()
    }

    /// Checks the number is 16 digits once spaces are removed
    ///
    /// # Errors
    ///
    /// [`PaymentError::InvalidCard`] otherwise.
    pub fn validate(&self) -> GatewayResult<()> {
        let digits = self.digits();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::InvalidCard(
                "card number must have 16 digits".to_string(),
            ));
        }
        Ok(())
    }

    /// The part of the card that may appear on a receipt
    #[must_use]
    pub fn summary(&self) -> CardSummary {
        CardSummary {
            last_four: self.last_four(),
            brand: "VISA".to_string(),
        }
    }
}

// Never print the full number or the CVV
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("last_four", &self.last_four())
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// Card data kept on a receipt
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    /// Last four digits
    pub last_four: String,
    /// Card brand
    pub brand: String,
}

// ============================================================================
// Requests and receipts
// ============================================================================

/// A charge to run through a gateway
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Payment method
    pub method: PaymentMethod,
    /// Amount including the commission
    pub amount: Money,
    /// Card details, for card payments
    pub card: Option<CardDetails>,
}

/// Proof of a successful charge
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Payment method
    pub method: PaymentMethod,
    /// Amount charged
    pub amount: Money,
    /// Gateway transaction id
    pub transaction_id: String,
    /// When the charge completed
    pub timestamp: DateTime<Utc>,
    /// Card used, for card payments
    pub card: Option<CardSummary>,
}

/// SBP payment invoice rendered as a QR code
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrInvoice {
    /// QR payload: `SBP|<unix-millis>|<amount>|<merchant>`
    pub payload: String,
    /// Amount to pay
    pub amount: Money,
    /// When the invoice was issued
    pub issued_at: DateTime<Utc>,
    /// The invoice cannot be paid from this instant on
    pub expires_at: DateTime<Utc>,
}

impl QrInvoice {
    /// Issues an invoice valid for `validity` from `now`
    #[must_use]
    pub fn issue(amount: Money, merchant: &str, now: DateTime<Utc>, validity: Duration) -> Self {
        let validity = chrono::Duration::from_std(validity).unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            payload: format!("SBP|{}|{}|{merchant}", now.timestamp_millis(), amount.minor()),
            amount,
            issued_at: now,
            expires_at: now.checked_add_signed(validity).unwrap_or(now),
        }
    }

    /// Whether the invoice has expired at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// Gateway
// ============================================================================

/// Payment gateway trait
///
/// Abstraction over payment providers (SBP, card acquiring, wallets).
pub trait PaymentGateway: Send + Sync {
    /// Charge a payment
    ///
    /// # Errors
    ///
    /// Returns an error if the charge is rejected
    fn charge(
        &self,
        request: PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentReceipt>> + Send>>;
}

/// Simulated processing time per payment method
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentDelays {
    /// SBP confirmation
    pub sbp: Duration,
    /// Card processing
    pub card: Duration,
    /// Every other method
    pub default: Duration,
}

impl PaymentDelays {
    /// No delay at all
    pub const INSTANT: Self = Self {
        sbp: Duration::ZERO,
        card: Duration::ZERO,
        default: Duration::ZERO,
    };

    /// Delay for `method`
    #[must_use]
    pub const fn for_method(&self, method: PaymentMethod) -> Duration {
        match method {
            PaymentMethod::Sbp => self.sbp,
            PaymentMethod::Card => self.card,
            PaymentMethod::YooMoney
            | PaymentMethod::Tinkoff
            | PaymentMethod::Qiwi
            | PaymentMethod::WebMoney => self.default,
        }
    }
}

impl Default for PaymentDelays {
    fn default() -> Self {
        Self {
            sbp: Duration::from_secs(5),
            card: Duration::from_secs(3),
            default: Duration::from_secs(2),
        }
    }
}

/// Mock payment gateway
///
/// Approves every well-formed charge after the method's simulated delay,
/// unless built with [`MockPaymentGateway::declining`].
#[derive(Clone)]
pub struct MockPaymentGateway {
    delays: PaymentDelays,
    clock: Arc<dyn Clock>,
    decline_reason: Option<String>,
}

impl MockPaymentGateway {
    /// Creates a gateway with the given delays
    #[must_use]
    pub fn new(delays: PaymentDelays, clock: Arc<dyn Clock>) -> Self {
        Self {
            delays,
            clock,
            decline_reason: None,
        }
    }

    /// A gateway that answers immediately, for tests
    #[must_use]
    pub fn instant(clock: Arc<dyn Clock>) -> Self {
        Self::new(PaymentDelays::INSTANT, clock)
    }

    /// Decline every charge with `reason`
    #[must_use]
    pub fn declining(mut self, reason: impl Into<String>) -> Self {
        self.decline_reason = Some(reason.into());
        self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(self) -> Arc<dyn PaymentGateway> {
        Arc::new(self)
    }
}

impl fmt::Debug for MockPaymentGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPaymentGateway")
            .field("delays", &self.delays)
            .field("decline_reason", &self.decline_reason)
            .finish_non_exhaustive()
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn charge(
        &self,
        request: PaymentRequest,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<PaymentReceipt>> + Send>> {
        let delay = self.delays.for_method(request.method);
        let clock = Arc::clone(&self.clock);
        let decline_reason = self.decline_reason.clone();

        Box::pin(async move {
            let card = if request.method.requires_card() {
                let card = request.card.as_ref().ok_or(PaymentError::MissingCard)?;
                card.validate()?;
                Some(card.summary())
            } else {
                None
            };

            // Simulate provider round trip
            tokio::time::sleep(delay).await;

            if let Some(reason) = decline_reason {
                tracing::warn!(method = %request.method, amount = request.amount.minor(), %reason, "Mock payment declined");
                return Err(PaymentError::Declined { reason });
            }

            let timestamp = clock.now();
            let prefix = if request.method == PaymentMethod::Sbp { "SBP" } else { "TXN" };
            let transaction_id = format!("{prefix}_{}", timestamp.timestamp_millis());

            tracing::info!(
                method = %request.method,
                amount = request.amount.minor(),
                transaction_id = %transaction_id,
                "Mock payment processed successfully"
            );

            Ok(PaymentReceipt {
                method: request.method,
                amount: request.amount,
                transaction_id,
                timestamp,
                card,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use keystore_testing::test_clock;

    fn card(number: &str) -> CardDetails {
        CardDetails {
            number: number.to_string(),
            expiry: "12/27".to_string(),
            cvv: "123".to_string(),
            holder: "IVAN PETROV".to_string(),
        }
    }

    #[test]
    fn test_fees_per_method() {
        let amount = Money::from_minor(10_000);
        let totals: Vec<u64> = PaymentMethod::ALL
            .into_iter()
            .map(|m| m.total_with_fee(amount).minor())
            .collect();
        assert_eq!(totals, vec![10_000, 10_250, 10_300, 10_150, 10_290, 10_080]);
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 4990 * 2.5% = 124.75
        assert_eq!(PaymentMethod::Card.fee(Money::from_minor(4990)), Money::from_minor(125));
        // 4990 * 0.8% = 39.92
        assert_eq!(PaymentMethod::WebMoney.fee(Money::from_minor(4990)), Money::from_minor(40));
    }

    #[test]
    fn test_only_sbp_is_popular() {
        let popular: Vec<_> = PaymentMethod::ALL.into_iter().filter(|m| m.is_popular()).collect();
        assert_eq!(popular, vec![PaymentMethod::Sbp]);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("yoomoney".parse::<PaymentMethod>().unwrap(), PaymentMethod::YooMoney);
        assert_eq!(" Card ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert_eq!(
            "bitcoin".parse::<PaymentMethod>(),
            Err(PaymentError::UnknownMethod("bitcoin".to_string()))
        );
    }

    #[test]
    fn test_method_serializes_as_id() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.id()));
        }
    }

    #[test]
    fn test_card_validation() {
        assert!(card("4111 1111 1111 1111").validate().is_ok());
        assert!(card("4111 1111 1111").validate().is_err());
        assert!(card("4111-1111-1111-1111").validate().is_err());
        assert_eq!(card("4111 1111 1111 4242").last_four(), "4242");
    }

    #[test]
    fn test_card_debug_hides_number() {
        let debug = format!("{:?}", card("4111 1111 1111 4242"));
        assert!(debug.contains("4242"));
        assert!(!debug.contains("4111"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn test_qr_invoice_payload_and_expiry() {
        let now = test_clock().now();
        let invoice = QrInvoice::issue(Money::from_minor(7990), "KeyStore", now, Duration::from_secs(900));

        assert_eq!(
            invoice.payload,
            format!("SBP|{}|7990|KeyStore", now.timestamp_millis())
        );
        assert!(!invoice.is_expired(now));
        assert!(!invoice.is_expired(now + chrono::Duration::seconds(899)));
        assert!(invoice.is_expired(now + chrono::Duration::seconds(900)));
    }

    #[tokio::test]
    async fn test_mock_sbp_payment() {
        let clock = Arc::new(test_clock());
        let gateway = MockPaymentGateway::instant(clock.clone());

        let receipt = gateway
            .charge(PaymentRequest {
                method: PaymentMethod::Sbp,
                amount: Money::from_minor(7990),
                card: None,
            })
            .await
            .unwrap();

        assert_eq!(receipt.transaction_id, format!("SBP_{}", clock.now().timestamp_millis()));
        assert_eq!(receipt.amount, Money::from_minor(7990));
        assert!(receipt.card.is_none());
    }

    #[tokio::test]
    async fn test_mock_card_payment_records_card_summary() {
        let gateway = MockPaymentGateway::instant(Arc::new(test_clock()));

        let receipt = gateway
            .charge(PaymentRequest {
                method: PaymentMethod::Card,
                amount: Money::from_minor(5115),
                card: Some(card("4111 1111 1111 4242")),
            })
            .await
            .unwrap();

        assert!(receipt.transaction_id.starts_with("TXN_"));
        assert_eq!(
            receipt.card,
            Some(CardSummary {
                last_four: "4242".to_string(),
                brand: "VISA".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_card_payment_without_card_is_rejected() {
        let gateway = MockPaymentGateway::instant(Arc::new(test_clock()));

        let result = gateway
            .charge(PaymentRequest {
                method: PaymentMethod::Card,
                amount: Money::from_minor(5115),
                card: None,
            })
            .await;

        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_declining_gateway() {
        let gateway = MockPaymentGateway::instant(Arc::new(test_clock())).declining("Insufficient funds");

        let result = gateway
            .charge(PaymentRequest {
                method: PaymentMethod::Qiwi,
                amount: Money::from_minor(100),
                card: None,
            })
            .await;

        assert_eq!(
            result,
            Err(PaymentError::Declined {
                reason: "Insufficient funds".to_string()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_gateway_waits_for_method_delay() {
        let gateway = MockPaymentGateway::new(PaymentDelays::default(), Arc::new(test_clock()));
        let started = tokio::time::Instant::now();

        let receipt = gateway
            .charge(PaymentRequest {
                method: PaymentMethod::Tinkoff,
                amount: Money::from_minor(100),
                card: None,
            })
            .await;

        tokio_test::assert_ok!(receipt);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }
}
