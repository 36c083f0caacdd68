use super::client::ApiClient;
use super::envelope;
use crate::errors::ApiError;
use crate::models::{NewOffer, Offer, OfferDecision, OfferStatusUpdate};

const OFFER_KEYS: &[&str] = &["data", "offer"];

impl ApiClient {
    pub async fn create_offer(&self, offer: &NewOffer) -> Result<Offer, ApiError> {
        let body = self.post("/offers", offer).await?;
        envelope::object(body, OFFER_KEYS)
    }

    pub async fn association_offers(&self, association_id: i64) -> Result<Vec<Offer>, ApiError> {
        let body = self
            .get(&format!("/association/{association_id}/offers"))
            .await?;
        envelope::list(body, &["offers", "data"])
    }

    pub async fn update_offer_status(
        &self,
        offer_id: i64,
        association_id: i64,
        decision: OfferDecision,
    ) -> Result<Offer, ApiError> {
        let update = OfferStatusUpdate {
            status: decision,
            association_id,
        };
        let body = self
            .patch(&format!("/offers/{offer_id}/status"), &update)
            .await?;
        envelope::object(body, OFFER_KEYS)
    }
}
