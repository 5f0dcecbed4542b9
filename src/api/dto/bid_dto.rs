//! Bid DTOs.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::required;
use crate::domain::{DriverId, JobId, Money, NewBid};
use crate::error::GatewayError;

/// Request body for `POST /driver/place-bid`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PlaceBidRequest {
    /// Job to bid on.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub job_id: Option<Uuid>,
    /// Bidding driver.
    #[schema(value_type = Option<String>, format = Uuid)]
    pub driver_id: Option<Uuid>,
    /// Offered price in dollars.
    pub bid_amount: Option<f64>,
    /// Driver's completion estimate in minutes.
    pub estimated_completion_time: Option<i64>,
    /// Optional note to the dealership.
    pub message: Option<String>,
}

impl TryFrom<PlaceBidRequest> for NewBid {
    type Error = GatewayError;

    fn try_from(req: PlaceBidRequest) -> Result<Self, Self::Error> {
        let dollars = required("bid_amount", req.bid_amount)?;
        let bid_amount = Money::from_dollars(dollars).ok_or_else(|| {
            GatewayError::Validation("bid_amount must be a non-negative number".to_string())
        })?;
        Ok(Self {
            job_id: JobId::from_uuid(required("job_id", req.job_id)?),
            driver_id: DriverId::from_uuid(required("driver_id", req.driver_id)?),
            bid_amount,
            estimated_completion_minutes: required(
                "estimated_completion_time",
                req.estimated_completion_time,
            )?,
            message: req.message,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn request() -> PlaceBidRequest {
        PlaceBidRequest {
            job_id: Some(Uuid::new_v4()),
            driver_id: Some(Uuid::new_v4()),
            bid_amount: Some(450.0),
            estimated_completion_time: Some(240),
            message: Some("Can pick up early".to_string()),
        }
    }

    #[test]
    fn dollars_become_cents() {
        let Ok(bid) = NewBid::try_from(request()) else {
            panic!("valid request");
        };
        assert_eq!(bid.bid_amount, Money::from_cents(45_000));
        assert_eq!(bid.estimated_completion_minutes, 240);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let req = PlaceBidRequest {
            bid_amount: Some(-5.0),
            ..request()
        };
        assert!(matches!(
            NewBid::try_from(req),
            Err(GatewayError::Validation(_))
        ));
    }

    #[test]
    fn missing_driver_is_named() {
        let req = PlaceBidRequest {
            driver_id: None,
            ..request()
        };
        let Err(GatewayError::Validation(msg)) = NewBid::try_from(req) else {
            panic!("expected validation error");
        };
        assert_eq!(msg, "driver_id is required");
    }
}
