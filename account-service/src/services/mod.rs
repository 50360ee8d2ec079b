pub mod ledger;
pub mod metrics;
pub mod repository;

pub use ledger::LedgerService;
pub use metrics::{get_metrics, init_metrics};
pub use repository::AccountRepository;
