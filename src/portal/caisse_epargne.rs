//! Caisse d'Épargne online-banking adapter.
//!
//! The portal protects password entry with ten shuffled image buttons, gates
//! login behind an out-of-band MFA approval, and loads account tiles
//! asynchronously. The adapter drives one exclusive browser session through
//! that flow: consent, identifier, keypad resolution, password clicks, MFA
//! clearance, tile discovery, balance parsing.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::balance;
use crate::browser::Browser;
use crate::config::{PortalConfig, TimingConfig};
use crate::keypad::{KeypadButton, KeypadResolver};
use crate::models::{AccountRequest, Balance, Currency};
use crate::ocr::DigitRecognizer;
use crate::poll::Waiter;

use super::PortalError;

const ACCESS_URL: &str = "https://www.caisse-epargne.fr/banque-a-distance/acceder-compte/";
const SSO_URL: &str = "https://www.caisse-epargne.fr/se-connecter/sso?service=dei";

const NO_CONSENT_BUTTON: &str = "#no_consent_btn";
const IDENTIFIER_INPUT: &str = "#input-identifier";
const KEYPAD_BUTTONS: &str = "button.keyboard-button";
const PASSWORD_SUBMIT: &str = "#p-password-btn-submit";
const MFA_FALLBACK_BUTTON: &str = "#m-identifier-cloudcard-btn-fallback";
const ACCOUNT_TILE: &str = "compte-contract-tile";
const TILE_LABEL: &str = "p[data-e2e=account-label]+p";
const TILE_BALANCE_SPANS: &str =
    "compte-ui-balance[data-e2e=compte-balance-contract] .balance span";

/// One-shot balance retrieval against the Caisse d'Épargne portal.
///
/// Collaborators are injected at construction; the adapter holds the browser
/// session exclusively for the duration of each call.
pub struct CaisseEpargne<B, R> {
    browser: B,
    resolver: KeypadResolver<R>,
    config: PortalConfig,
    timing: TimingConfig,
}

impl<B: Browser, R: DigitRecognizer> CaisseEpargne<B, R> {
    pub fn new(browser: B, recognizer: R, config: PortalConfig, timing: TimingConfig) -> Self {
        Self {
            browser,
            resolver: KeypadResolver::new(recognizer),
            config,
            timing,
        }
    }

    /// Balance of the configured checking account, in euros.
    pub async fn get_checking_account_balance(&self) -> Result<Balance, PortalError> {
        let request = AccountRequest {
            account_id: self.config.checking_account.clone(),
            currency: Currency::Eur,
        };

        let mut balances = self.get_balances(std::slice::from_ref(&request)).await?;
        balances
            .remove(&request.account_id)
            .ok_or_else(|| PortalError::AccountsNotFound {
                account_ids: vec![request.account_id],
            })
    }

    /// Log in and read the balance of every requested account.
    ///
    /// Fails with [`PortalError::AccountsNotFound`] naming every requested
    /// account that had no tile, even when others were found.
    pub async fn get_balances(
        &self,
        requests: &[AccountRequest],
    ) -> Result<HashMap<String, Balance>, PortalError> {
        let wanted: HashMap<&str, Currency> = requests
            .iter()
            .map(|request| (request.account_id.as_str(), request.currency))
            .collect();

        info!(accounts = requests.len(), "starting portal login");

        self.browser.navigate(ACCESS_URL).await?;
        let no_consent = self.browser.find(NO_CONSENT_BUTTON).await?;
        self.browser.click(&no_consent).await?;

        self.browser.navigate(SSO_URL).await?;
        let identifier = self.browser.find(IDENTIFIER_INPUT).await?;
        self.browser
            .type_text(&identifier, &self.config.account_id)
            .await?;
        self.browser.press_enter(&identifier).await?;

        // TODO: poll for the keypad buttons instead of a fixed settle delay.
        tokio::time::sleep(self.timing.settle).await;

        debug!("resolving the shuffled keypad");
        let mut buttons = Vec::new();
        for element in self.browser.find_all(KEYPAD_BUTTONS).await? {
            let style = self
                .browser
                .style_property(&element, "background-image")
                .await?;
            buttons.push(KeypadButton::new(element, style));
        }
        let keypad = self.resolver.resolve(buttons).await?;

        debug!("entering the password through the digit-ordered keypad");
        for button in keypad.click_sequence(self.config.account_password.expose_secret())? {
            self.browser.click(button).await?;
        }

        let submit = self.browser.find(PASSWORD_SUBMIT).await?;
        self.browser.click(&submit).await?;

        tokio::time::sleep(self.timing.settle).await;
        let url = self.browser.current_url().await?;
        debug!(%url, "password submitted");

        let mfa = Waiter::new(self.timing.mfa_attempts, self.timing.mfa_delay);
        mfa.wait_until(|| async {
            match self.browser.try_find(MFA_FALLBACK_BUTTON).await? {
                None => Ok(true),
                Some(_) => {
                    warn!("MFA dialog still present, waiting for out-of-band approval");
                    Ok(false)
                }
            }
        })
        .await?;
        info!("MFA cleared");

        let discovery = Waiter::new(self.timing.tiles_attempts, self.timing.tiles_delay);
        discovery
            .wait_until(|| async {
                Ok(!self.browser.find_all(ACCOUNT_TILE).await?.is_empty())
            })
            .await?;

        let tiles = self.browser.find_all(ACCOUNT_TILE).await?;
        debug!(tiles = tiles.len(), "account tiles discovered");

        let mut balances = HashMap::new();
        for tile in &tiles {
            let label = self.browser.find_in(tile, TILE_LABEL).await?;
            let account_id = self.browser.text(&label).await?.trim().to_string();

            let Some(&currency) = wanted.get(account_id.as_str()) else {
                continue;
            };

            let spans = self.browser.find_all_in(tile, TILE_BALANCE_SPANS).await?;
            let [whole, fractional] = spans.as_slice() else {
                return Err(PortalError::BalanceFragments { found: spans.len() });
            };

            let whole = self.browser.text(whole).await?;
            let fractional = self.browser.text(fractional).await?;
            let amount = balance::parse_fragments(&whole, &fractional, currency.symbol())?;

            debug!(account = %account_id, %amount, "balance parsed");
            balances.insert(account_id, Balance::now(amount, currency));
        }

        let missing: Vec<String> = requests
            .iter()
            .map(|request| request.account_id.clone())
            .filter(|account_id| !balances.contains_key(account_id))
            .collect();
        if !missing.is_empty() {
            return Err(PortalError::AccountsNotFound {
                account_ids: missing,
            });
        }

        info!(balances = balances.len(), "portal login complete");
        Ok(balances)
    }
}
