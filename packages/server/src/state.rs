use crate::config::AppConfig;
use crate::service::RecordService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub records: RecordService,
}
