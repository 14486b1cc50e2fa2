use domain::error::Error;
use events::ClientHandle;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /live`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct LiveParams {
    /// Handle received in the `connected` SSE event.
    pub(crate) client_id: String,
}

impl LiveParams {
    pub(crate) fn client(&self) -> Result<ClientHandle, Error> {
        self.client_id
            .parse()
            .map_err(|_| Error::invalid("client_id is not a valid client handle"))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LiveResponse {
    /// False when the client handle is not connected.
    pub(crate) accepted: bool,
    pub(crate) fired: bool,
    /// Distinct clients corroborating since the last alert.
    pub(crate) corroborators: usize,
}
