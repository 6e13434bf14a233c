use crate::domain::card::{Card, CardFilter, CreditDetails};
use crate::domain::ports::{CardStoreRef, ClockRef};
use crate::domain::role::Role;
use crate::error::{PaymentError, Result};
use tracing::info;

/// Owner-scoped card management. Every lookup is filtered by owner, and deleted
/// cards are invisible.
pub struct CardService {
    cards: CardStoreRef,
    clock: ClockRef,
}

impl CardService {
    pub fn new(cards: CardStoreRef, clock: ClockRef) -> Self {
        Self { cards, clock }
    }

    /// Classifies and stores a new card. Unrecognised numbers are rejected.
    pub async fn create(&self, owner_id: &str, owner_role: Role, raw_number: &str) -> Result<Card> {
        let card = Card::new(owner_id, owner_role, raw_number, self.clock.now())?;
        self.cards.insert(card.clone()).await?;
        info!(card = %card.id, owner = %owner_id, network = %card.network, "Card created");
        Ok(card)
    }

    pub async fn get(&self, card_id: &str, owner_id: &str, owner_role: Role) -> Result<Card> {
        self.cards
            .select_one(&CardFilter::by_id(card_id).owned_by(owner_id, owner_role))
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("Card {}", card_id)))
    }

    pub async fn list(&self, owner_id: &str, owner_role: Role) -> Result<Vec<Card>> {
        self.cards
            .select_many(&CardFilter::by_owner(owner_id, owner_role))
            .await
    }

    pub async fn delete(&self, card_id: &str, owner_id: &str, owner_role: Role) -> Result<()> {
        let filter = CardFilter::by_id(card_id).owned_by(owner_id, owner_role);
        if self.cards.soft_delete(&filter, self.clock.now()).await? == 0 {
            return Err(PaymentError::NotFoundError(format!("Card {}", card_id)));
        }
        info!(card = %card_id, owner = %owner_id, "Card deleted");
        Ok(())
    }

    /// Attaches holder, expiration and CVV to a non-debit card, once.
    pub async fn set_credit_details(
        &self,
        card_id: &str,
        owner_id: &str,
        owner_role: Role,
        details: CreditDetails,
    ) -> Result<Card> {
        let filter = CardFilter::by_id(card_id).owned_by(owner_id, owner_role);
        // Validate against the current row first so a refusal never reaches the store.
        let mut card = self
            .cards
            .select_one(&filter)
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("Card {}", card_id)))?;
        let now = self.clock.now();
        card.set_credit_details(details.clone(), now)?;

        if self.cards.update_fields(&filter, &details, now).await? == 0 {
            return Err(PaymentError::NotFoundError(format!("Card {}", card_id)));
        }
        Ok(card)
    }
}
