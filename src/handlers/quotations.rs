use serde::{Deserialize, Serialize};

use crate::error::{Result, SourcingError};
use crate::models::{NotifySupplierEntry, NotifySuppliersRequest, Quotation};
use crate::quotations::{generate_mock_quotations, map_quotations};
use crate::store::SessionRepository;

use super::ApiHandlers;

/// Seeker GST sent with every notification request
const SEEKER_GST: &str = "29AAHCN8165F1Z2";

/// Request body for POST /api/quotations/request and /api/quotations/fetch
#[derive(Debug, Deserialize)]
pub struct QuotationParams {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct RequestQuotationsResponse {
    pub requirement_id: String,
    pub notified_suppliers: usize,
}

#[derive(Debug, Serialize)]
pub struct FetchQuotationsResult {
    pub quotations: Vec<Quotation>,
}

impl<R: SessionRepository> ApiHandlers<R> {
    /// Notify the selected suppliers and persist the returned tracking id
    pub async fn handle_request_quotations(
        &self,
        params: QuotationParams,
    ) -> Result<RequestQuotationsResponse> {
        let mut session = self.load_session(&params.session_id).await?;

        let Some(user) = session.user.clone() else {
            return Err(SourcingError::Validation(
                "Please log in before requesting quotations".to_string(),
            ));
        };

        let selected = session.selected_suppliers();
        if selected.is_empty() {
            return Err(SourcingError::Validation(
                "No suppliers selected".to_string(),
            ));
        }

        let item_name = session
            .requirement
            .product
            .clone()
            .or_else(|| selected[0].details.get("Products").cloned())
            .unwrap_or_else(|| "Product".to_string());

        let suppliers = selected
            .iter()
            .map(|supplier| NotifySupplierEntry {
                supp_gst: supplier
                    .details
                    .get("GST Number")
                    .cloned()
                    .unwrap_or_else(|| format!("29AAHCN{}165F1Z2", supplier.id)),
                supp_gst_name: supplier.name.clone(),
                supp_email: supplier.details.get("Email").cloned(),
            })
            .collect::<Vec<_>>();
        let notified = suppliers.len();

        let request = NotifySuppliersRequest {
            seek_mobile: user.mobile,
            item_name,
            suppliers,
            seek_gst: Some(SEEKER_GST.to_string()),
            seek_gst_name: Some(user.name),
            seek_item_qty_req: session.requirement.quantity.clone(),
            seek_item_del_day_req: session.requirement.delivery_days.clone(),
            seek_delivery_pin: session.requirement.pincode.clone(),
        };

        // A failed notification propagates as an error and leaves the
        // session where it was, selections intact
        let requirement_id = self.notifier.notify_suppliers(&request).await?;

        session.record_notification(requirement_id.clone());
        self.sessions.save(&session).await?;

        Ok(RequestQuotationsResponse {
            requirement_id,
            notified_suppliers: notified,
        })
    }

    /// Poll for quotations. A service failure falls back to synthesizing one
    /// placeholder quotation per snapshotted supplier, tagged synthetic.
    pub async fn handle_fetch_quotations(
        &self,
        params: QuotationParams,
    ) -> Result<FetchQuotationsResult> {
        let mut session = self.load_session(&params.session_id).await?;

        let Some(requirement_id) = session.requirement_id.clone() else {
            return Err(SourcingError::Validation(
                "Quotation request not found".to_string(),
            ));
        };

        let quotations = match self.quotation_client.fetch_quotations(&requirement_id).await {
            Ok(api_quotations) => map_quotations(&api_quotations),
            Err(e) => {
                tracing::warn!(
                    "Quotation fetch failed ({e}); falling back to synthetic quotations"
                );
                if session.selected_snapshot.is_empty() {
                    return Err(SourcingError::Validation(
                        "No suppliers selected".to_string(),
                    ));
                }
                let Some(user) = session.user.clone() else {
                    return Err(SourcingError::Validation(
                        "Please log in before fetching quotations".to_string(),
                    ));
                };
                generate_mock_quotations(&session.selected_snapshot, &user)
            }
        };

        session.record_quotations(quotations.clone());
        self.sessions.save(&session).await?;

        Ok(FetchQuotationsResult { quotations })
    }

    /// Look up one received quotation for rendering
    pub async fn get_quotation(&self, session_id: &str, quotation_id: &str) -> Result<Quotation> {
        let session = self.load_session(session_id).await?;
        session
            .quotations
            .iter()
            .find(|q| q.id == quotation_id)
            .cloned()
            .ok_or_else(|| SourcingError::NotFound(format!("Unknown quotation {quotation_id}")))
    }
}
