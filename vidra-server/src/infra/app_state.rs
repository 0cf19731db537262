use std::{fmt, sync::Arc};

use vidra_core::{
    application::unit_of_work::AppUnitOfWork, family::service::FamilyService,
    resume::service::ResumeService,
};

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub unit_of_work: Arc<AppUnitOfWork>,
    pub resume: Arc<ResumeService>,
    pub family: Arc<FamilyService>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
