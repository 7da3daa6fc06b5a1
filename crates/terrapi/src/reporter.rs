//! Routes assembly events to the tracing subscriber.

use terrapi_core::{Event, Reporter};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &Event) {
        match event {
            Event::Started {
                target,
                style,
                provider,
            } => info!(
                "Generating {} project for {} in {}",
                style,
                provider,
                target.display()
            ),
            Event::PassStarted {
                step,
                source,
                target,
            } => debug!(
                "Materializing {} from {} into {}",
                step,
                source,
                target.display()
            ),
            Event::FileWritten { path } => debug!("Wrote {}", path.display()),
            Event::FileFailed { path, cause } => warn!("Failed to write {}: {}", path.display(), cause),
            Event::Finished { written, failed } => {
                if *failed == 0 {
                    info!("Wrote {} files", written);
                } else {
                    warn!("Wrote {} files, {} failed", written, failed);
                }
            }
        }
    }
}
