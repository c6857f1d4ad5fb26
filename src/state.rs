use std::sync::Arc;
use std::time::Duration;

use crate::clients::face::{FaceApiClient, FaceGeometry, FaceMatcher};
use crate::clients::mailer::{MailApiClient, NoopNotifier, Notifier};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AttendanceService, EnrollmentService, OtpVault, SeaOrmAttendanceService,
    SeaOrmEnrollmentService,
};

/// External capabilities the services depend on; production wiring builds
/// the HTTP clients, tests pass mocks.
pub struct Capabilities {
    pub geometry: Arc<dyn FaceGeometry>,
    pub matcher: Arc<dyn FaceMatcher>,
    pub notifier: Arc<dyn Notifier>,
}

impl Capabilities {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let face_client = Arc::new(FaceApiClient::new(&config.face_api)?);

        let notifier: Arc<dyn Notifier> = if config.mailer.enabled {
            Arc::new(MailApiClient::new(config.mailer.clone())?)
        } else {
            Arc::new(NoopNotifier)
        };

        Ok(Self {
            geometry: face_client.clone(),
            matcher: face_client,
            notifier,
        })
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub otp_vault: OtpVault,

    pub enrollment_service: Arc<dyn EnrollmentService>,

    pub attendance_service: Arc<dyn AttendanceService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let capabilities = Capabilities::from_config(&config)?;
        Self::with_capabilities(config, capabilities).await
    }

    pub async fn with_capabilities(
        config: Config,
        capabilities: Capabilities,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let otp_vault = OtpVault::new(Duration::from_secs(config.attendance.otp_ttl_minutes * 60));

        let enrollment_service = Arc::new(SeaOrmEnrollmentService::new(
            store.clone(),
            otp_vault.clone(),
            capabilities.notifier.clone(),
        )) as Arc<dyn EnrollmentService>;

        let attendance_service = Arc::new(SeaOrmAttendanceService::new(
            store.clone(),
            capabilities.geometry,
            capabilities.matcher,
            capabilities.notifier,
            config.attendance.clone(),
        )) as Arc<dyn AttendanceService>;

        Ok(Self {
            config,
            store,
            otp_vault,
            enrollment_service,
            attendance_service,
        })
    }
}
