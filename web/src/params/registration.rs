use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /register`.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RegisterParams {
    #[serde(default)]
    pub(crate) nickname: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RegisterResponse {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}
