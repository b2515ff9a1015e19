use std::sync::Arc;

use crate::client::ApiClient;
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub views: Arc<Views>,
}
