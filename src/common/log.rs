use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

const DEFAULT_DIRECTIVES: &str = "hy3_layout=info,hy3ctl=info";

/// Installs the global subscriber: an indented span tree on stderr,
/// filtered by `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(DEFAULT_DIRECTIVES));
    let tree = HierarchicalLayer::new(2)
        .with_targets(true)
        .with_bracketed_fields(true)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed by an embedding program.
    let _ = Registry::default().with(filter).with(tree).try_init();
}
