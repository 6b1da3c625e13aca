//! Wiring of every digital-entry service over one store.

use std::sync::Arc;

use archivehub_core::config::ArchiveConfig;
use archivehub_core::traits::Clock;
use archivehub_database::ArchiveStore;

use crate::access::AccessEvaluator;
use crate::entry::EntryService;
use crate::file::DownloadService;
use crate::recycle_bin::BinService;
use crate::share::ShareService;

/// All services sharing one store and clock.
#[derive(Debug, Clone)]
pub struct ArchiveServices {
    /// Ownership and delegated-right checks.
    pub access: Arc<AccessEvaluator>,
    /// Entry lifecycle.
    pub entries: Arc<EntryService>,
    /// Bin management.
    pub bin: Arc<BinService>,
    /// Sharing.
    pub shares: Arc<ShareService>,
    /// Downloads.
    pub downloads: Arc<DownloadService>,
}

impl ArchiveServices {
    /// Builds every service over `store`.
    pub fn new(store: Arc<dyn ArchiveStore>, clock: Arc<dyn Clock>, config: ArchiveConfig) -> Self {
        let access = Arc::new(AccessEvaluator::new(Arc::clone(&store), Arc::clone(&clock)));

        let entries = Arc::new(EntryService::new(
            Arc::clone(&store),
            Arc::clone(&access),
            Arc::clone(&clock),
            config.clone(),
        ));
        let bin = Arc::new(BinService::new(
            Arc::clone(&store),
            Arc::clone(&access),
            Arc::clone(&clock),
            config,
        ));
        let shares = Arc::new(ShareService::new(
            Arc::clone(&store),
            Arc::clone(&access),
            clock,
        ));
        let downloads = Arc::new(DownloadService::new(store, Arc::clone(&access)));

        Self {
            access,
            entries,
            bin,
            shares,
            downloads,
        }
    }
}
