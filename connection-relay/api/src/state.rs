use std::sync::Arc;

use connection_monitor::ConnectionMonitor;

use crate::models::proxy::RelayMode;
use crate::services::relay::RelayClient;

// App state
pub struct AppState {
   pub monitor: Arc<ConnectionMonitor>,
   pub relay: RelayClient,
   pub default_mode: RelayMode,
}
