pub(crate) mod health_check_controller;
pub(crate) mod live_controller;
pub(crate) mod registration_controller;
pub(crate) mod subscription_controller;
